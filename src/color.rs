use crate::error::{PosterError, PosterResult};
use once_cell::sync::Lazy;
use regex::Regex;

static HEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#([0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap());

const NAMED_COLORS: [(&str, [u8; 3]); 12] = [
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("silver", [192, 192, 192]),
    ("red", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("blue", [0, 0, 255]),
    ("navy", [0, 0, 128]),
    ("teal", [0, 128, 128]),
    ("orange", [255, 165, 0]),
    ("beige", [245, 245, 220]),
];

/// An sRGB color with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` or a basic color name.
    /// `field` only feeds the error message.
    pub fn parse(field: &str, value: &str) -> PosterResult<Self> {
        let trimmed = value.trim();
        let invalid = || PosterError::InvalidColor {
            field: field.to_string(),
            value: value.to_string(),
        };

        if HEX_RE.is_match(trimmed) {
            let digits = &trimmed[1..];
            let expanded: String = if digits.len() <= 4 {
                digits.chars().flat_map(|c| [c, c]).collect()
            } else {
                digits.to_string()
            };
            let byte = |idx: usize| u8::from_str_radix(&expanded[idx..idx + 2], 16).map_err(|_| invalid());
            let a = if expanded.len() == 8 { byte(6)? } else { 255 };
            return Ok(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a,
            });
        }

        let lower = trimmed.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, [r, g, b])| Self::rgb(*r, *g, *b))
            .ok_or_else(invalid)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn opacity(self) -> f32 {
        self.a as f32 / 255.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Color::parse("bg", "#FFF").unwrap(), Color::rgb(255, 255, 255));
        assert_eq!(Color::parse("bg", "#1a2B3c").unwrap(), Color::rgb(0x1a, 0x2b, 0x3c));
        let translucent = Color::parse("bg", "#00000080").unwrap();
        assert_eq!(translucent.a, 0x80);
        assert!((translucent.opacity() - 0.502).abs() < 0.01);
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(Color::parse("text", "White").unwrap().to_hex(), "#ffffff");
    }

    #[test]
    fn rejects_garbage() {
        let err = Color::parse("water", "#12345").unwrap_err();
        assert!(matches!(err, PosterError::InvalidColor { ref field, .. } if field == "water"));
        assert!(Color::parse("water", "not-a-color").is_err());
    }
}
