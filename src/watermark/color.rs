//! Color literals and opacity.
//!
//! Accepted forms, tried in order:
//! - hex: `#RGB`, `#RRGGBB`, `#RRGGBBAA`
//! - functional: `rgb(r, g, b)`, `rgba(r, g, b, a)` where `a` is 0-255, or
//!   0.0-1.0 when written with a decimal point
//! - a small named-color table
//!
//! `none`, `transparent` and anything unrecognized parse to no color.

use image::Rgba;

/// RGBA color with byte channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    /// Same color with its alpha scaled by `opacity`.
    pub fn with_opacity(self, opacity: f64) -> Self {
        Self {
            a: apply_opacity(self.a, opacity),
            ..self
        }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }

    /// `rgba()` literal with a fractional alpha, as external tools expect.
    pub fn to_css(self) -> String {
        format!(
            "rgba({},{},{},{:.3})",
            self.r,
            self.g,
            self.b,
            self.a as f64 / 255.0
        )
    }
}

const NAMED_COLORS: &[(&str, Color)] = &[
    ("black", Color::new(0, 0, 0, 255)),
    ("white", Color::new(255, 255, 255, 255)),
    ("red", Color::new(255, 0, 0, 255)),
    ("green", Color::new(0, 128, 0, 255)),
    ("blue", Color::new(0, 0, 255, 255)),
    ("yellow", Color::new(255, 255, 0, 255)),
    ("cyan", Color::new(0, 255, 255, 255)),
    ("magenta", Color::new(255, 0, 255, 255)),
    ("gray", Color::new(128, 128, 128, 255)),
];

/// Parse a color literal. `None` means "no color".
pub fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim().to_lowercase();
    if value.is_empty() || value == "none" || value == "transparent" {
        return None;
    }

    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(inner) = functional_args(&value, "rgba") {
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if let [r, g, b, a] = parts[..] {
            return Some(Color::new(channel(r)?, channel(g)?, channel(b)?, alpha(a)));
        }
        return None;
    }
    if let Some(inner) = functional_args(&value, "rgb") {
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if let [r, g, b] = parts[..] {
            return Some(Color::new(channel(r)?, channel(g)?, channel(b)?, 255));
        }
        return None;
    }

    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == value)
        .map(|(_, color)| *color)
}

/// Scale an alpha byte by `opacity`, rounding to nearest.
///
/// `opacity <= 0` gives 0 and `opacity >= 1` leaves the alpha unchanged.
pub fn apply_opacity(alpha: u8, opacity: f64) -> u8 {
    if opacity <= 0.0 {
        0
    } else if opacity >= 1.0 {
        alpha
    } else {
        (alpha as f64 * opacity).round() as u8
    }
}

fn functional_args<'a>(value: &'a str, name: &str) -> Option<&'a str> {
    value
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let digit = |i: usize| byte(&hex[i..i + 1]).map(|d| d * 17);
            Some(Color::new(digit(0)?, digit(1)?, digit(2)?, 255))
        }
        6 | 8 => {
            let a = if hex.len() == 8 { byte(&hex[6..8])? } else { 255 };
            Some(Color::new(
                byte(&hex[0..2])?,
                byte(&hex[2..4])?,
                byte(&hex[4..6])?,
                a,
            ))
        }
        _ => None,
    }
}

/// Integer channel, clamped to 0-255.
fn channel(s: &str) -> Option<u8> {
    s.parse::<i64>().ok().map(|v| v.clamp(0, 255) as u8)
}

/// Alpha in 0-255, or 0.0-1.0 when it has a decimal point. Unparseable is opaque.
fn alpha(s: &str) -> u8 {
    if s.contains('.') {
        match s.parse::<f64>() {
            Ok(f) if f.is_finite() => (f.clamp(0.0, 1.0) * 255.0).round() as u8,
            _ => 255,
        }
    } else {
        channel(s).unwrap_or(255)
    }
}
