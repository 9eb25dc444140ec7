//! RGBA colors: hex parsing, seed-derived palettes, tolerance matching.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Color parsing errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("invalid hex color literal: {0}")]
    InvalidHex(String),
}

/// An RGBA sample, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba { r: 0, g: 0, b: 0, a: 0 };
    pub const BLACK: Rgba = Rgba { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Rgba = Rgba { r: 255, g: 255, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully opaque color.
    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError::InvalidHex(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(err)?;
        let nibble = |i: usize| -> Result<u8, ColorParseError> {
            hex.as_bytes()
                .get(i)
                .and_then(|b| (*b as char).to_digit(16))
                .map(|d| d as u8)
                .ok_or_else(err)
        };
        match hex.len() {
            3 => {
                let r = nibble(0)?;
                let g = nibble(1)?;
                let b = nibble(2)?;
                Ok(Self::opaque(r << 4 | r, g << 4 | g, b << 4 | b))
            }
            6 | 8 => {
                let byte = |i: usize| -> Result<u8, ColorParseError> {
                    Ok(nibble(i)? << 4 | nibble(i + 1)?)
                };
                let a = if hex.len() == 8 { byte(6)? } else { 255 };
                Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, a))
            }
            _ => Err(err()),
        }
    }

    /// Symmetric per-channel match: every channel within `tolerance`.
    pub fn matches_within(&self, other: Rgba, tolerance: u8) -> bool {
        self.r.abs_diff(other.r) <= tolerance
            && self.g.abs_diff(other.g) <= tolerance
            && self.b.abs_diff(other.b) <= tolerance
            && self.a.abs_diff(other.a) <= tolerance
    }

    /// Stable, vivid color derived from a seed.
    ///
    /// The hue comes from the seed modulo 360 so the same seed always yields
    /// the same color on any peer.
    pub fn from_seed(seed: u32) -> Self {
        let hue = (seed % 360) as f32 / 360.0;
        let (r, g, b) = hsl_to_rgb(hue, 0.7, 0.6);
        Self::opaque(
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
        )
    }

    /// Same color with the alpha channel scaled by `factor` ∈ [0, 1].
    pub fn with_alpha_scaled(&self, factor: f32) -> Rgba {
        Rgba {
            a: (self.a as f32 * factor.clamp(0.0, 1.0)).round() as u8,
            ..*self
        }
    }

    pub fn to_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(c: [u8; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

/// HSL to RGB conversion helper.
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    if s == 0.0 {
        return (l, l, l); // Achromatic
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    (r, g, b)
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_rrggbb() {
        let c = Rgba::from_hex("#ff0000").unwrap();
        assert_eq!(c, Rgba::opaque(255, 0, 0));
    }

    #[test]
    fn test_from_hex_short() {
        let c = Rgba::from_hex("#f0a").unwrap();
        assert_eq!(c, Rgba::opaque(255, 0, 170));
    }

    #[test]
    fn test_from_hex_with_alpha() {
        let c = Rgba::from_hex("#11223380").unwrap();
        assert_eq!(c, Rgba::new(0x11, 0x22, 0x33, 0x80));
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert!(Rgba::from_hex("ff0000").is_err()); // missing '#'
        assert!(Rgba::from_hex("#ff00").is_err()); // bad length
        assert!(Rgba::from_hex("#zzzzzz").is_err()); // non-hex digits
    }

    #[test]
    fn test_matches_within_exact() {
        let a = Rgba::opaque(10, 20, 30);
        assert!(a.matches_within(a, 0));
        assert!(!a.matches_within(Rgba::opaque(11, 20, 30), 0));
    }

    #[test]
    fn test_matches_within_tolerance() {
        let a = Rgba::opaque(100, 100, 100);
        let b = Rgba::opaque(105, 95, 100);
        assert!(a.matches_within(b, 5));
        assert!(b.matches_within(a, 5)); // symmetric
        assert!(!a.matches_within(b, 4));
    }

    #[test]
    fn test_matches_within_checks_alpha() {
        let a = Rgba::new(0, 0, 0, 255);
        let b = Rgba::new(0, 0, 0, 0);
        assert!(!a.matches_within(b, 100));
        assert!(a.matches_within(b, 255));
    }

    #[test]
    fn test_from_seed_stable() {
        assert_eq!(Rgba::from_seed(12345), Rgba::from_seed(12345));
    }

    #[test]
    fn test_from_seed_opaque() {
        for seed in [0u32, 1, 359, 360, 99999] {
            assert_eq!(Rgba::from_seed(seed).a, 255);
        }
    }

    #[test]
    fn test_with_alpha_scaled() {
        let c = Rgba::new(10, 20, 30, 200);
        assert_eq!(c.with_alpha_scaled(0.5).a, 100);
        assert_eq!(c.with_alpha_scaled(2.0).a, 200); // clamped
        assert_eq!(c.with_alpha_scaled(0.5).r, 10); // color untouched
    }

    #[test]
    fn test_hsl_to_rgb_red() {
        let (r, g, b) = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((r - 1.0).abs() < 0.01);
        assert!(g.abs() < 0.01);
        assert!(b.abs() < 0.01);
    }

    #[test]
    fn test_hsl_to_rgb_achromatic() {
        let (r, g, b) = hsl_to_rgb(0.3, 0.0, 0.5);
        assert!((r - 0.5).abs() < 0.01);
        assert!((g - 0.5).abs() < 0.01);
        assert!((b - 0.5).abs() < 0.01);
    }
}
