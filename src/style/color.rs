//! Colors and the deterministic color allocator

use crate::core::constants::{COLOR_SEED, COLOR_SPACE, COLOR_STRIDE};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque RGB color, written as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Color from the low 24 bits of `value` (`0xRRGGBB`)
    pub const fn from_u24(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }

    pub fn to_u24(&self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }

    /// Parses `#rrggbb` or `#rgb`
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || MapError::Config(format!("invalid hex color '{}'", value));
        let hex = value.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        match hex.len() {
            6 => u32::from_str_radix(hex, 16)
                .map(Self::from_u24)
                .map_err(|_| invalid()),
            3 => {
                let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
                u32::from_str_radix(&expanded, 16)
                    .map(Self::from_u24)
                    .map_err(|_| invalid())
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for HexColor {
    type Error = MapError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.to_string()
    }
}

#[cfg(feature = "egui")]
impl From<HexColor> for egui::Color32 {
    fn from(color: HexColor) -> Self {
        egui::Color32::from_rgb(color.r, color.g, color.b)
    }
}

/// Deterministic color sequence.
///
/// Each call advances the cursor by `stride` and wraps it into the
/// `modulus`-sized color space, so a given seed and call order always yields
/// the same colors. With the default constants the stride is odd and the
/// modulus is 2^24, which makes the sequence visit every color once before
/// repeating; no such guarantee holds for arbitrary parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorAllocator {
    seed: u32,
    value: u32,
    stride: u32,
    modulus: u32,
}

impl ColorAllocator {
    /// Allocator over the 24-bit color space. A zero stride is bumped to one.
    pub fn new(seed: u32, stride: u32) -> Self {
        Self::with_modulus(seed, stride, COLOR_SPACE)
    }

    /// `modulus` is clamped into `1..=2^24`.
    pub fn with_modulus(seed: u32, stride: u32, modulus: u32) -> Self {
        let modulus = modulus.clamp(1, COLOR_SPACE);
        let seed = seed % modulus;
        Self {
            seed,
            value: seed,
            stride: stride.max(1),
            modulus,
        }
    }

    /// Advances the cursor and returns the color it lands on
    pub fn next_color(&mut self) -> HexColor {
        self.value = ((u64::from(self.value) + u64::from(self.stride)) % u64::from(self.modulus)) as u32;
        HexColor::from_u24(self.value)
    }

    /// Restarts the sequence from the seed
    pub fn reset(&mut self) {
        self.value = self.seed;
    }

    /// Current cursor position
    pub fn cursor(&self) -> u32 {
        self.value
    }
}

impl Default for ColorAllocator {
    fn default() -> Self {
        Self::new(COLOR_SEED, COLOR_STRIDE)
    }
}
