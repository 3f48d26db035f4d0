//! Node-local transforms

use crate::point::*;
use nalgebra::{Matrix4, UnitQuaternion};
use serde::{Deserialize, Serialize};

/// Translation, rotation and scale of a scene node relative to its parent.
///
/// Composed as `T * R * S`, the same order glTF uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeTransform {
    pub translation: Vector3f,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3f,
}

impl NodeTransform {
    pub fn identity() -> Self {
        Self {
            translation: Vector3f::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3f::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_translation(translation: Vector3f) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Build from glTF's decomposed form: translation, `[x, y, z, w]` rotation, scale
    pub fn from_decomposed(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        let quaternion = nalgebra::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]);
        Self {
            translation: translation.into(),
            rotation: UnitQuaternion::from_quaternion(quaternion),
            scale: scale.into(),
        }
    }

    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.scale = Vector3f::new(scale, scale, scale);
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scale_applies_before_translation() {
        let mut t = NodeTransform::from_translation(Vector3f::new(1.0, 2.0, 3.0));
        t.set_uniform_scale(0.01);
        let p = t.to_matrix().transform_point(&Point3f::new(100.0, 100.0, 100.0));
        assert_relative_eq!(p, Point3f::new(2.0, 3.0, 4.0), epsilon = 1e-5);
    }

    #[test]
    fn test_decomposed_rotation_order() {
        // 90 degrees about +Y, glTF stores [x, y, z, w]
        let half = std::f32::consts::FRAC_1_SQRT_2;
        let t = NodeTransform::from_decomposed([0.0; 3], [0.0, half, 0.0, half], [1.0; 3]);
        let p = t.to_matrix().transform_point(&Point3f::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3f::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }
}
