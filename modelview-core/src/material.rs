//! Surface materials attached to mesh nodes

use crate::color::Color;
use serde::{Deserialize, Serialize};

/// Metallic-roughness material
///
/// `version` increases every time the material is marked dirty, so a
/// renderer can tell whether its uploaded copy is stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: Option<String>,
    pub color: Color,
    pub roughness: f32,
    pub metalness: f32,
    pub double_sided: bool,
    version: u64,
}

impl Material {
    /// Flat color material with the given roughness and no metalness
    pub fn standard(color: Color, roughness: f32) -> Self {
        Self {
            color,
            roughness,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the base color and mark the material for re-upload
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.mark_dirty();
    }

    pub fn mark_dirty(&mut self) {
        self.version += 1;
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            color: Color::WHITE,
            roughness: 1.0,
            metalness: 0.0,
            double_sided: false,
            version: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_color_bumps_version() {
        let mut material = Material::standard(Color::WHITE, 0.5);
        assert_eq!(material.version(), 0);
        material.set_color(Color::RED);
        assert_eq!(material.color, Color::RED);
        assert_eq!(material.version(), 1);
    }
}
