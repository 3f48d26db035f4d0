//! # modelview GPU
//!
//! wgpu device management and a forward renderer for a [`Scene`]: every
//! visible mesh node is drawn with its material color under the scene's
//! ambient and directional lights.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use modelview_gpu::{SceneRenderer, SceneRenderConfig};
//!
//! async fn example(window: Arc<winit::window::Window>) -> modelview_core::Result<()> {
//!     let renderer = SceneRenderer::new(window, SceneRenderConfig::default()).await?;
//!     let (width, height) = renderer.size();
//!     println!("surface is {}x{}", width, height);
//!     Ok(())
//! }
//! ```
//!
//! [`Scene`]: modelview_core::Scene

pub mod device;
pub mod mesh;

pub use device::GpuContext;
pub use mesh::{
    srgb_to_linear, Frame, LightingUniform, MeshCache, MeshKey, MeshVertex, ModelUniform, SceneRenderConfig,
    SceneRenderer, UniformState, MAX_DIRECTIONAL_LIGHTS,
};
