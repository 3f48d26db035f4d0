//! Seams between the viewer logic and the window system

use modelview_core::{Result, Scene};

use crate::camera::Camera;

/// Something the viewer can draw a frame onto
///
/// The display size is what the window currently shows; the buffer size is
/// what the drawing buffer was last configured with. The viewer resizes the
/// buffer whenever the two differ.
pub trait RenderSurface {
    fn display_size(&self) -> (u32, u32);

    fn buffer_size(&self) -> (u32, u32);

    fn resize_buffer(&mut self, width: u32, height: u32);

    /// Draw one frame of `scene` as seen from `camera`
    fn draw(&mut self, scene: &Scene, camera: &Camera) -> Result<()>;
}

/// Receives a notification when the pickable node is clicked
pub trait PickNotifier {
    fn acknowledge(&mut self, node_name: &str);
}

impl<F: FnMut(&str)> PickNotifier for F {
    fn acknowledge(&mut self, node_name: &str) {
        self(node_name)
    }
}
