//! Hex color parsing.

use std::fmt;

/// Fallback for unparseable color strings.
pub const GRAY: Rgba = Rgba::new(128, 128, 128, 255);

/// Fallback for empty color strings.
pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);

/// Default label halo color.
pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

/// Straight (non-premultiplied) 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Replace alpha with `round(opacity · 255)`, opacity clamped to [0, 1].
    ///
    /// Any alpha from an `#AARRGGBB` value is discarded.
    pub fn with_opacity(self, opacity: f64) -> Self {
        let opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let a = (opacity * 255.0).round() as u8;
        Self { a, ..self }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(
                f,
                "#{:02X}{:02X}{:02X}{:02X}",
                self.a, self.r, self.g, self.b
            )
        }
    }
}

/// Parse `#RGB`, `#RRGGBB` or `#AARRGGBB` (leading `#` optional).
///
/// Empty input yields black and anything unparseable yields gray, so a
/// broken style value degrades instead of failing the tile.
pub fn parse_color(value: &str) -> Rgba {
    let value = value.trim();
    if value.is_empty() {
        return BLACK;
    }
    try_parse_hex(value.strip_prefix('#').unwrap_or(value)).unwrap_or(GRAY)
}

/// Parse a color and apply layer opacity in one step.
pub fn parse_color_with_opacity(value: &str, opacity: f64) -> Rgba {
    parse_color(value).with_opacity(opacity)
}

fn try_parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);

    match hex.len() {
        3 => Some(Rgba::new(nibble(0)?, nibble(1)?, nibble(2)?, 255)),
        6 => Some(Rgba::new(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(Rgba::new(byte(2)?, byte(4)?, byte(6)?, byte(0)?)),
        _ => None,
    }
}
