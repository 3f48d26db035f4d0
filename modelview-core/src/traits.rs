//! Core traits for modelview

use crate::{bounds::Aabb, mesh::TriangleMesh, point::Point3f};

/// Anything with spatial extent
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> Aabb;

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        self.bounding_box().center()
    }
}

impl Drawable for TriangleMesh {
    fn bounding_box(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }
}
