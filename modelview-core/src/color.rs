//! RGB colors as used by materials, lights and the scene background

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An sRGB-encoded color with components in `[0, 1]`
///
/// Hex strings are sRGB. Linear values such as glTF base color factors go
/// through [`Color::from_linear`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a color from a packed `0xRRGGBB` value
    pub fn from_hex_u32(hex: u32) -> Self {
        let [_, r, g, b] = hex.to_be_bytes();
        Self::from_rgb8([r, g, b])
    }

    pub fn from_rgb8(rgb: [u8; 3]) -> Self {
        Self::new(
            rgb[0] as f32 / 255.0,
            rgb[1] as f32 / 255.0,
            rgb[2] as f32 / 255.0,
        )
    }

    /// Parse `#rrggbb` or `rrggbb`
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(Error::InvalidColor(s.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Self::from_hex_u32)
            .map_err(|_| Error::InvalidColor(s.to_string()))
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Encode linear components as sRGB
    pub fn from_linear(r: f32, g: f32, b: f32) -> Self {
        Self::new(linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b))
    }

    /// Decode to linear components for shading
    pub fn to_linear(self) -> [f32; 3] {
        [srgb_to_linear(self.r), srgb_to_linear(self.g), srgb_to_linear(self.b)]
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl From<[f32; 3]> for Color {
    fn from(rgb: [f32; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_hex_with_and_without_hash() {
        let a = Color::from_hex("#ff0000").unwrap();
        let b: Color = "0000ff".parse().unwrap();
        assert_eq!(a, Color::RED);
        assert_eq!(b, Color::BLUE);
    }

    #[test]
    fn test_packed_background() {
        let c = Color::from_hex_u32(0xeeeeee);
        assert_relative_eq!(c.r, 238.0 / 255.0);
        assert_eq!(c.to_hex(), "#eeeeee");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(Color::from_hex("#fff").is_err());
        assert!(Color::from_hex("#gggggg").is_err());
        assert!(Color::from_hex("").is_err());
    }

    #[test]
    fn test_linear_conversion_endpoints() {
        assert_eq!(Color::WHITE.to_linear(), [1.0, 1.0, 1.0]);
        assert_eq!(Color::BLACK.to_linear(), [0.0, 0.0, 0.0]);
        assert_relative_eq!(Color::from_linear(1.0, 0.0, 1.0).r, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_linear_factor_is_encoded() {
        // Linear 0.2 is sRGB 0x7c
        let c = Color::from_linear(0.8, 0.2, 0.1);
        assert_eq!(c.to_rgb8()[1], 0x7c);
        assert!(c.r > 0.8);
        let back = c.to_linear();
        assert_relative_eq!(back[0], 0.8, epsilon = 1e-5);
        assert_relative_eq!(back[1], 0.2, epsilon = 1e-5);
        assert_relative_eq!(back[2], 0.1, epsilon = 1e-5);
    }
}
