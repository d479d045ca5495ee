use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use biomap_core::{BiomapError, BiomapResult};

/// Straight (non-premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const GREY: Color = Color([128, 128, 128, 255]);
    pub const TRANSPARENT: Color = Color([0, 0, 0, 0]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color([r, g, b, 255])
    }

    pub fn with_alpha(self, alpha: u8) -> Self {
        let [r, g, b, _] = self.0;
        Color([r, g, b, alpha])
    }

    pub fn alpha(&self) -> u8 {
        self.0[3]
    }

    pub fn is_transparent(&self) -> bool {
        self.0[3] == 0
    }

    /// Parse `#RRGGBB`, `#RRGGBBAA` or one of `white`, `black`, `grey`/`gray`, `none`.
    pub fn parse(value: &str) -> BiomapResult<Self> {
        let trimmed = value.trim();
        let named = match trimmed.to_ascii_lowercase().as_str() {
            "white" => Some(Color::WHITE),
            "black" => Some(Color::BLACK),
            "grey" | "gray" => Some(Color::GREY),
            "none" | "transparent" => Some(Color::TRANSPARENT),
            _ => None,
        };
        if let Some(color) = named {
            return Ok(color);
        }
        parse_hex(trimmed).ok_or_else(|| BiomapError::InvalidColor { value: value.to_string() })
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba(self.0)
    }

    /// `#rrggbb`, with an alpha byte appended when not opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.0;
        if a == 255 {
            format!("#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }

    /// SVG paint value and opacity.
    pub fn to_svg(&self) -> (String, f32) {
        if self.is_transparent() {
            return ("none".to_string(), 0.0);
        }
        let [r, g, b, a] = self.0;
        (format!("#{:02x}{:02x}{:02x}", r, g, b), a as f32 / 255.0)
    }
}

// Parse a hex color like "#RRGGBB" or "#RRGGBBAA"
fn parse_hex(s: &str) -> Option<Color> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 && hex.len() != 8 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Some(Color([channel(0)?, channel(2)?, channel(4)?, alpha]))
}

impl FromStr for Color {
    type Err = BiomapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}

impl TryFrom<String> for Color {
    type Error = BiomapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_and_names() {
        assert_eq!(Color::parse("#fd8d3c").unwrap(), Color::rgb(0xfd, 0x8d, 0x3c));
        assert_eq!(Color::parse("FD8D3C80").unwrap(), Color([0xfd, 0x8d, 0x3c, 0x80]));
        assert_eq!(Color::parse("Grey").unwrap(), Color::GREY);
        assert!(Color::parse("none").unwrap().is_transparent());
    }

    #[test]
    fn test_invalid_color() {
        assert!(matches!(Color::parse("#12345"), Err(BiomapError::InvalidColor { .. })));
        assert!(Color::parse("#zzzzzz").is_err());
        assert!(Color::parse("#ééé").is_err());
    }

    #[test]
    fn test_hex_output() {
        assert_eq!(Color::rgb(1, 2, 255).to_hex(), "#0102ff");
        assert_eq!(Color::BLACK.with_alpha(0x80).to_string(), "#00000080");
    }
}
