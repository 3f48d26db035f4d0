//! Core data structures for modelview
//!
//! This crate provides the scene graph that a loaded model lives in:
//! named nodes with transforms, triangle geometry, materials and lights,
//! together with bounding boxes and ray casting against the graph.

pub mod point;
pub mod color;
pub mod material;
pub mod mesh;
pub mod bounds;
pub mod traits;
pub mod transform;
pub mod scene;
pub mod raycast;
pub mod error;

pub use point::*;
pub use color::*;
pub use material::*;
pub use mesh::*;
pub use bounds::*;
pub use traits::*;
pub use transform::*;
pub use scene::*;
pub use raycast::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4, UnitQuaternion};
