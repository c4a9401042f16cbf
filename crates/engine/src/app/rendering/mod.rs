use glam::Mat4;

mod renderer;
mod transform;

pub use renderer::{FrameCanvas, Renderer};
pub use transform::{ndc_to_screen, Viewport};

/// Draw surface handed to scenes. Quads are unit squares centred on the
/// model origin.
pub trait RenderTarget {
    fn set_view_projection(&mut self, view: Mat4, projection: Mat4);
    fn draw_quad(&mut self, model: Mat4, color: [u8; 4]);
}
