//! I/O operations for modelview
//!
//! Reads glTF 2.0 models (`.gltf` with external or embedded buffers, and
//! binary `.glb`) into a [`SceneNode`] tree, either synchronously or on a
//! background thread that reports progress over a channel.

pub mod gltf_read;
pub mod loader;
pub mod error;

#[cfg(test)]
mod tests;

pub use error::*;
pub use gltf_read::{sanitize_name, GltfReader, NameRegistry};
pub use loader::{spawn_load, LoadEvent, LoadHandle};

use modelview_core::SceneNode;
use std::path::Path;

/// File extensions accepted as model assets
pub const MODEL_EXTENSIONS: &[&str] = &["gltf", "glb"];

/// Trait for reading a whole scene from a file
pub trait SceneReader {
    fn read_scene<P: AsRef<Path>>(path: P) -> Result<SceneNode, IoError>;
}

/// Reject paths whose extension is not a supported model format
pub fn check_extension(path: &Path) -> Result<(), IoError> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some(e) if MODEL_EXTENSIONS.contains(&e) => Ok(()),
        _ => Err(IoError::InvalidFormat {
            format: format!("{:?}", path.extension()),
        }),
    }
}

/// Auto-detect format and read a scene
pub fn read_scene<P: AsRef<Path>>(path: P) -> Result<SceneNode, IoError> {
    let path = path.as_ref();
    check_extension(path)?;
    GltfReader::read_scene(path)
}
