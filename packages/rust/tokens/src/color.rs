//! Small sRGB color helpers for token derivation.
//!
//! Only what the resolver needs: hex parsing, lighten/darken by RGB lerp
//! toward white/black, channel mixing, and WCAG relative luminance.

use stylepress_shared::{Result, StylePressError};

/// An 8-bit-per-channel sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse `#rgb` or `#rrggbb`. The field name is carried into the error so
    /// callers see which personality color was malformed.
    pub fn parse(value: &str, field: &str) -> Result<Self> {
        let hex = value.trim().trim_start_matches('#');
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => {
                return Err(StylePressError::validation(format!(
                    "{field}: expected #rgb or #rrggbb color, got {value:?}"
                )));
            }
        };

        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| {
                StylePressError::validation(format!(
                    "{field}: invalid hex color {value:?}"
                ))
            })
        };

        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Lowercase `#rrggbb` form.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Lerp each channel toward white by `amount` (0.0–1.0).
    pub fn lighten(self, amount: f64) -> Self {
        self.lerp(Rgb { r: 255, g: 255, b: 255 }, amount)
    }

    /// Lerp each channel toward black by `amount` (0.0–1.0).
    pub fn darken(self, amount: f64) -> Self {
        self.lerp(Rgb { r: 0, g: 0, b: 0 }, amount)
    }

    /// Channel-wise linear interpolation toward `other`.
    pub fn lerp(self, other: Rgb, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }

    /// WCAG relative luminance (0.0 = black, 1.0 = white).
    pub fn relative_luminance(self) -> f64 {
        fn linearize(channel: u8) -> f64 {
            let c = f64::from(channel) / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * linearize(self.r) + 0.7152 * linearize(self.g) + 0.0722 * linearize(self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(
            Rgb::parse("#336699", "test").unwrap(),
            Rgb { r: 0x33, g: 0x66, b: 0x99 }
        );
        assert_eq!(
            Rgb::parse("#369", "test").unwrap(),
            Rgb { r: 0x33, g: 0x66, b: 0x99 }
        );
    }

    #[test]
    fn rejects_malformed_hex_naming_the_field() {
        let err = Rgb::parse("rgb(1,2,3)", "colors.primary").unwrap_err();
        assert!(err.to_string().contains("colors.primary"));
    }

    #[test]
    fn hex_roundtrip_is_lowercase() {
        let c = Rgb::parse("#AABBCC", "test").unwrap();
        assert_eq!(c.to_hex(), "#aabbcc");
    }

    #[test]
    fn lighten_and_darken_move_toward_extremes() {
        let c = Rgb { r: 100, g: 100, b: 100 };
        assert!(c.lighten(0.2).r > c.r);
        assert!(c.darken(0.2).r < c.r);
        assert_eq!(c.lighten(1.0), Rgb { r: 255, g: 255, b: 255 });
        assert_eq!(c.darken(1.0), Rgb { r: 0, g: 0, b: 0 });
    }

    #[test]
    fn luminance_extremes() {
        let white = Rgb { r: 255, g: 255, b: 255 };
        let black = Rgb { r: 0, g: 0, b: 0 };
        assert!((white.relative_luminance() - 1.0).abs() < 1e-9);
        assert!(black.relative_luminance() < 1e-9);
    }
}
