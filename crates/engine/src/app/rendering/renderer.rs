use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::Simulation;

use super::transform::ndc_to_screen;
use super::{RenderTarget, Viewport};

const CLEAR_COLOR: [u8; 4] = [56, 56, 56, 255];
const QUAD_CORNERS: [Vec3; 4] = [
    Vec3::new(-0.5, -0.5, 0.0),
    Vec3::new(0.5, -0.5, 0.0),
    Vec3::new(0.5, 0.5, 0.0),
    Vec3::new(-0.5, 0.5, 0.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenRectPx {
    left: i32,
    right: i32,
    top: i32,
    bottom: i32,
}

/// Window-backed software renderer.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    /// Clears, draws the active scene and presents. Presenting may block on
    /// vsync.
    pub fn render_frame(&mut self, simulation: &Simulation) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        let mut canvas = FrameCanvas::new(self.pixels.frame_mut(), self.viewport);
        canvas.clear(CLEAR_COLOR);
        simulation.render(&mut canvas);

        self.pixels.render()
    }
}

/// RGBA8 frame buffer that scenes draw into.
pub struct FrameCanvas<'a> {
    frame: &'a mut [u8],
    viewport: Viewport,
    clip_from_world: Mat4,
}

impl<'a> FrameCanvas<'a> {
    pub fn new(frame: &'a mut [u8], viewport: Viewport) -> Self {
        Self {
            frame,
            viewport,
            clip_from_world: Mat4::IDENTITY,
        }
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    fn quad_screen_rect(&self, model: Mat4) -> ScreenRectPx {
        let clip_from_model = self.clip_from_world * model;
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for corner in QUAD_CORNERS {
            let ndc = clip_from_model.project_point3(corner).truncate();
            let screen = ndc_to_screen(ndc, self.viewport);
            min = min.min(screen);
            max = max.max(screen);
        }
        ScreenRectPx {
            left: min.x.round() as i32,
            right: max.x.round() as i32,
            top: min.y.round() as i32,
            bottom: max.y.round() as i32,
        }
    }
}

impl RenderTarget for FrameCanvas<'_> {
    fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.clip_from_world = projection * view;
    }

    fn draw_quad(&mut self, model: Mat4, color: [u8; 4]) {
        let rect = self.quad_screen_rect(model);
        fill_rect_clipped(self.frame, self.viewport, rect, color);
    }
}

/// Fills the half-open pixel rectangle `[left, right) x [top, bottom)`.
fn fill_rect_clipped(frame: &mut [u8], viewport: Viewport, rect: ScreenRectPx, color: [u8; 4]) {
    let left = rect.left.max(0);
    let top = rect.top.max(0);
    let right = rect.right.min(viewport.width as i32);
    let bottom = rect.bottom.min(viewport.height as i32);
    for y in top..bottom {
        for x in left..right {
            write_pixel_rgba_clipped(frame, viewport.width as usize, x, y, color);
        }
    }
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}
