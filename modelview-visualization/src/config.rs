//! Viewer configuration
//!
//! All fields have defaults, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! mode = "pick"
//! model_path = "assets/model.gltf"
//!
//! [roles]
//! pickable = "mesh_64"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use modelview_core::{Color, Error, Result};
use serde::{Deserialize, Serialize};

/// Which of the two viewer variants is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionMode {
    /// Orbit only, with a color picker for the whole model
    #[default]
    FreeOrbit,
    /// Orbit plus picking, highlight materials and a visibility toggle
    #[serde(alias = "pick")]
    PickAndHighlight,
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionMode::FreeOrbit => write!(f, "free-orbit"),
            InteractionMode::PickAndHighlight => write!(f, "pick"),
        }
    }
}

impl FromStr for InteractionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "free-orbit" | "orbit" => Ok(InteractionMode::FreeOrbit),
            "pick" | "pick-and-highlight" => Ok(InteractionMode::PickAndHighlight),
            other => Err(Error::Config(format!("unknown interaction mode '{}'", other))),
        }
    }
}

/// Names of the model nodes that get special treatment in pick mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeRoles {
    /// Clicking this node shows a notification
    pub pickable: String,
    /// The toggle button shows and hides this node
    pub toggle: String,
    /// Gets the accent material, applied after the highlight material
    pub accent: String,
    /// Meshes that get the highlight material
    pub highlight: Vec<String>,
}

impl Default for NodeRoles {
    fn default() -> Self {
        Self {
            pickable: "mesh_64".to_string(),
            toggle: "mesh_58".to_string(),
            accent: "mesh_58".to_string(),
            highlight: ["mesh_64", "mesh_60", "mesh_61", "mesh_62", "mesh_63"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Materials used by pick mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightStyle {
    pub highlight_color: Color,
    pub accent_color: Color,
    pub roughness: f32,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            highlight_color: Color::RED,
            accent_color: Color::BLUE,
            roughness: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub mode: InteractionMode,
    /// Model loaded at startup
    pub model_path: Option<PathBuf>,
    /// Initial color applied to every mesh in free-orbit mode
    pub color: Color,
    /// Uniform scale applied to the loaded model root
    pub scale: f32,
    pub roles: NodeRoles,
    pub highlight: HighlightStyle,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            mode: InteractionMode::default(),
            model_path: None,
            color: Color::WHITE,
            scale: 0.01,
            roles: NodeRoles::default(),
            highlight: HighlightStyle::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::Config(format!("scale must be positive, got {}", self.scale)));
        }
        if !(0.0..=1.0).contains(&self.highlight.roughness) {
            return Err(Error::Config(format!(
                "roughness must be within [0, 1], got {}",
                self.highlight.roughness
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.mode, InteractionMode::FreeOrbit);
        assert_eq!(config.roles.highlight.len(), 5);
    }

    #[test]
    fn test_partial_toml() {
        let config = ViewerConfig::from_toml_str(
            r##"
mode = "pick"
color = "#00ff00"

[roles]
toggle = "door"
"##,
        )
        .unwrap();
        assert_eq!(config.mode, InteractionMode::PickAndHighlight);
        assert_eq!(config.color, Color::from_hex("#00ff00").unwrap());
        assert_eq!(config.roles.toggle, "door");
        assert_eq!(config.roles.pickable, "mesh_64");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ViewerConfig::from_toml_str("scale = 0.0").is_err());
        assert!(ViewerConfig::from_toml_str("color = \"not-a-color\"").is_err());
        assert!(ViewerConfig::from_toml_str("mode = \"fly\"").is_err());
        assert!(ViewerConfig::from_toml_str("[highlight]\nroughness = 2.0").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = ViewerConfig::default();
        config.mode = InteractionMode::PickAndHighlight;
        config.model_path = Some(PathBuf::from("model.glb"));
        let text = config.to_toml_string().unwrap();
        assert_eq!(ViewerConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.toml");
        std::fs::write(&path, "scale = 0.5\n").unwrap();
        let config = ViewerConfig::load(&path).unwrap();
        assert_eq!(config.scale, 0.5);
        assert!(ViewerConfig::load(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("pick".parse::<InteractionMode>().unwrap(), InteractionMode::PickAndHighlight);
        assert_eq!("Free-Orbit".parse::<InteractionMode>().unwrap(), InteractionMode::FreeOrbit);
        assert!("fly".parse::<InteractionMode>().is_err());
    }
}
