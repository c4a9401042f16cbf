use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Maps normalised device coordinates to pixel space (y grows downward).
pub fn ndc_to_screen(ndc: Vec2, viewport: Viewport) -> Vec2 {
    Vec2::new(
        (ndc.x + 1.0) * 0.5 * viewport.width as f32,
        (1.0 - ndc.y) * 0.5 * viewport.height as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::camera::CameraRig;
    use glam::Mat4;

    fn world_to_screen(world: Vec2, clip_from_world: Mat4, viewport: Viewport) -> (i32, i32) {
        let ndc = clip_from_world.project_point3(world.extend(0.0)).truncate();
        let screen = ndc_to_screen(ndc, viewport);
        (screen.x.round() as i32, screen.y.round() as i32)
    }

    #[test]
    fn origin_maps_to_viewport_center() {
        let viewport = Viewport {
            width: 800,
            height: 600,
        };
        let (x, y) = world_to_screen(Vec2::ZERO, Mat4::IDENTITY, viewport);
        assert_eq!(x, 400);
        assert_eq!(y, 300);
    }

    #[test]
    fn camera_offset_shifts_screen_position() {
        let viewport = Viewport {
            width: 640,
            height: 480,
        };
        let rig = CameraRig::default();
        let matrices = rig.matrices(Vec2::new(10.0, 0.0), Vec2::ZERO, 1.0);
        let clip_from_world = matrices.projection * matrices.view;

        let centre = world_to_screen(Vec2::new(10.0, -3.75), clip_from_world, viewport);
        let one_right_one_up = world_to_screen(Vec2::new(11.0, -2.75), clip_from_world, viewport);

        assert_eq!(centre, (320, 240));
        assert_eq!(one_right_one_up, (384, 176));
    }

    #[test]
    fn ndc_corners_map_to_viewport_corners() {
        let viewport = Viewport {
            width: 100,
            height: 50,
        };
        assert_eq!(ndc_to_screen(Vec2::new(-1.0, 1.0), viewport), Vec2::ZERO);
        assert_eq!(
            ndc_to_screen(Vec2::new(1.0, -1.0), viewport),
            Vec2::new(100.0, 50.0)
        );
    }
}
