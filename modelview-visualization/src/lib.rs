//! Interactive glTF model viewer
//!
//! This crate ties the scene model, loader and renderer together:
//! - Perspective camera and damped orbit controls
//! - Viewer configuration (TOML)
//! - The viewer controller: loading, placement, materials, picking
//! - A winit/egui window hosting the controller

pub mod camera;
pub mod config;
pub mod controller;
pub mod controls;
pub mod interactive_viewer;
pub mod surface;

pub use camera::*;
pub use config::*;
pub use controller::*;
pub use controls::*;
pub use interactive_viewer::{DialogNotifier, InteractiveViewer};
pub use surface::*;

use modelview_core::Result;
use std::path::Path;

/// Open a window showing the model at `path` in free-orbit mode
pub fn show_model<P: AsRef<Path>>(path: P) -> Result<()> {
    let config = ViewerConfig {
        model_path: Some(path.as_ref().to_path_buf()),
        ..ViewerConfig::default()
    };
    InteractiveViewer::new(config).run()
}
