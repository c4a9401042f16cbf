use glam::{Mat4, Vec2, Vec3};

pub const LEVEL_LEFT_EDGE: f32 = 5.0;
pub const CAMERA_VERTICAL_OFFSET: f32 = 3.75;
pub const VIEW_HALF_WIDTH: f32 = 5.0;
pub const VIEW_HALF_HEIGHT: f32 = 3.75;

/// Matrices handed to the renderer for one draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixSet {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl MatrixSet {
    pub fn clip_from_model(&self) -> Mat4 {
        self.projection * self.view * self.model
    }
}

/// Stateless view composer: every call rebuilds the view from the current
/// player position and the active effect's offset and zoom.
#[derive(Debug, Clone, Copy)]
pub struct CameraRig {
    left_edge: f32,
    vertical_offset: f32,
    half_extents: Vec2,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            left_edge: LEVEL_LEFT_EDGE,
            vertical_offset: CAMERA_VERTICAL_OFFSET,
            half_extents: Vec2::new(VIEW_HALF_WIDTH, VIEW_HALF_HEIGHT),
        }
    }
}

impl CameraRig {
    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh_gl(
            -self.half_extents.x,
            self.half_extents.x,
            -self.half_extents.y,
            self.half_extents.y,
            -1.0,
            1.0,
        )
    }

    /// World x the camera centres on: the player once past the left edge,
    /// otherwise the edge itself.
    pub fn follow_x(&self, player_position: Vec2) -> f32 {
        if player_position.x > self.left_edge {
            player_position.x
        } else {
            self.left_edge
        }
    }

    /// `zoom` scales about the view centre after the follow and effect
    /// translations; 1 leaves the view unscaled.
    pub fn compose_view(&self, player_position: Vec2, effect_offset: Vec2, zoom: f32) -> Mat4 {
        let follow = Vec3::new(-self.follow_x(player_position), self.vertical_offset, 0.0);
        Mat4::from_scale(Vec3::new(zoom, zoom, 1.0))
            * Mat4::from_translation(follow)
            * Mat4::from_translation(effect_offset.extend(0.0))
    }

    pub fn matrices(&self, player_position: Vec2, effect_offset: Vec2, zoom: f32) -> MatrixSet {
        MatrixSet {
            model: Mat4::IDENTITY,
            view: self.compose_view(player_position, effect_offset, zoom),
            projection: self.projection(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translation_of(view: Mat4) -> Vec3 {
        view.w_axis.truncate()
    }

    #[test]
    fn player_left_of_edge_pins_camera_to_edge() {
        let rig = CameraRig::default();
        let view = rig.compose_view(Vec2::new(2.0, -1.0), Vec2::ZERO, 1.0);

        assert_eq!(
            translation_of(view),
            Vec3::new(-LEVEL_LEFT_EDGE, CAMERA_VERTICAL_OFFSET, 0.0)
        );
    }

    #[test]
    fn player_exactly_on_edge_is_pinned() {
        let rig = CameraRig::default();
        assert_eq!(rig.follow_x(Vec2::new(LEVEL_LEFT_EDGE, 0.0)), LEVEL_LEFT_EDGE);
    }

    #[test]
    fn player_right_of_edge_is_followed_exactly() {
        let rig = CameraRig::default();
        let view = rig.compose_view(Vec2::new(9.25, -4.0), Vec2::ZERO, 1.0);

        assert_eq!(
            translation_of(view),
            Vec3::new(-9.25, CAMERA_VERTICAL_OFFSET, 0.0)
        );
    }

    #[test]
    fn effect_offset_is_added_to_view_translation() {
        let rig = CameraRig::default();
        let view = rig.compose_view(Vec2::new(7.0, 0.0), Vec2::new(0.1, -0.2), 1.0);
        let translation = translation_of(view);

        assert!((translation.x - (-6.9)).abs() < 1e-6);
        assert!((translation.y - (CAMERA_VERTICAL_OFFSET - 0.2)).abs() < 1e-6);
    }

    #[test]
    fn camera_centre_maps_to_clip_origin() {
        let rig = CameraRig::default();
        let matrices = rig.matrices(Vec2::new(8.0, 0.0), Vec2::ZERO, 1.0);
        let clip = matrices
            .clip_from_model()
            .project_point3(Vec3::new(8.0, -CAMERA_VERTICAL_OFFSET, 0.0));

        assert!(clip.x.abs() < 1e-6);
        assert!(clip.y.abs() < 1e-6);
    }

    #[test]
    fn zoom_scales_about_the_view_centre() {
        let rig = CameraRig::default();
        let view = rig.compose_view(Vec2::new(8.0, 0.0), Vec2::ZERO, 1.5);

        let centre = view.transform_point3(Vec3::new(8.0, -CAMERA_VERTICAL_OFFSET, 0.0));
        let one_right = view.transform_point3(Vec3::new(9.0, -CAMERA_VERTICAL_OFFSET, 0.0));

        assert!(centre.truncate().length() < 1e-6);
        assert!((one_right.x - 1.5).abs() < 1e-6);
        assert!(one_right.y.abs() < 1e-6);
    }

    #[test]
    fn projection_spans_the_configured_view_box() {
        let rig = CameraRig::default();
        let corner = rig
            .projection()
            .project_point3(Vec3::new(VIEW_HALF_WIDTH, VIEW_HALF_HEIGHT, 0.0));

        assert!((corner.x - 1.0).abs() < 1e-6);
        assert!((corner.y - 1.0).abs() < 1e-6);
    }
}
