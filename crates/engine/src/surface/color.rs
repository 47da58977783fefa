use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Straight-alpha RGBA fill colour, written as a CSS hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("colour must start with '#': {0:?}")]
    MissingHash(String),
    #[error("colour must have 3, 6 or 8 hex digits: {0:?}")]
    InvalidLength(String),
    #[error("colour contains a non-hex digit: {0:?}")]
    InvalidDigit(String),
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let digits = raw
            .strip_prefix('#')
            .ok_or_else(|| ColorError::MissingHash(raw.to_string()))?;
        if !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidDigit(raw.to_string()));
        }

        let channel = |index: usize| u8::from_str_radix(&digits[index..index + 2], 16);
        let short = |index: usize| {
            u8::from_str_radix(&digits[index..index + 1], 16).map(|nibble| nibble * 17)
        };
        let parsed = match digits.len() {
            3 => (short(0), short(1), short(2), Ok(255)),
            6 => (channel(0), channel(2), channel(4), Ok(255)),
            8 => (channel(0), channel(2), channel(4), channel(6)),
            _ => return Err(ColorError::InvalidLength(raw.to_string())),
        };
        match parsed {
            (Ok(r), Ok(g), Ok(b), Ok(a)) => Ok(Color { r, g, b, a }),
            _ => Err(ColorError::InvalidDigit(raw.to_string())),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}
