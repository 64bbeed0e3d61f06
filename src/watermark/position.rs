//! Watermark geometry.
//!
//! Gravity placement, offset clamping, auto-fit and logo sizing, all in
//! pixel space.
//!
//! # Example
//!
//! ```
//! use image_cli::engine::Dimensions;
//! use image_cli::watermark::position::{place, Gravity};
//!
//! let base = Dimensions::new(1000, 800);
//! let overlay = Dimensions::new(100, 50);
//! let pos = place(base, overlay, Gravity::SouthEast, 0, 0);
//! assert_eq!((pos.x, pos.y), (900, 750));
//! ```

use std::str::FromStr;

use crate::engine::{Dimensions, PlacementPosition};
use crate::error::AppError;

/// Share of the base an overlay may cover on either axis before auto-fit
/// shrinks it.
pub const AUTO_FIT_RATIO: f64 = 0.9;

/// Compass anchor for an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gravity {
    NorthWest,
    North,
    NorthEast,
    West,
    Center,
    East,
    SouthWest,
    South,
    #[default]
    SouthEast,
}

impl Gravity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NorthWest => "northwest",
            Self::North => "north",
            Self::NorthEast => "northeast",
            Self::West => "west",
            Self::Center => "center",
            Self::East => "east",
            Self::SouthWest => "southwest",
            Self::South => "south",
            Self::SouthEast => "southeast",
        }
    }
}

impl FromStr for Gravity {
    type Err = AppError;

    /// Compass names, plus the `top-left` style names. Empty means southeast.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "southeast" | "bottom-right" => Ok(Self::SouthEast),
            "northwest" | "top-left" => Ok(Self::NorthWest),
            "north" | "top-center" | "top" => Ok(Self::North),
            "northeast" | "top-right" => Ok(Self::NorthEast),
            "west" | "center-left" | "left" => Ok(Self::West),
            "center" | "centre" => Ok(Self::Center),
            "east" | "center-right" | "right" => Ok(Self::East),
            "southwest" | "bottom-left" => Ok(Self::SouthWest),
            "south" | "bottom-center" | "bottom" => Ok(Self::South),
            other => Err(AppError::invalid_argument(format!(
                "unknown gravity: {}",
                other
            ))),
        }
    }
}

/// Top-left corner of `overlay` inside `base`.
///
/// Offsets are added to the anchor, then each axis is clamped to
/// `[0, max(0, base - overlay)]`. Oversized overlays are clipped rather
/// than rejected.
pub fn place(
    base: Dimensions,
    overlay: Dimensions,
    gravity: Gravity,
    offset_x: i32,
    offset_y: i32,
) -> PlacementPosition {
    let max_x = base.width as i64 - overlay.width as i64;
    let max_y = base.height as i64 - overlay.height as i64;
    let center_x = max_x / 2;
    let center_y = max_y / 2;

    let (left, top) = match gravity {
        Gravity::NorthWest => (0, 0),
        Gravity::North => (center_x, 0),
        Gravity::NorthEast => (max_x, 0),
        Gravity::West => (0, center_y),
        Gravity::Center => (center_x, center_y),
        Gravity::East => (max_x, center_y),
        Gravity::SouthWest => (0, max_y),
        Gravity::South => (center_x, max_y),
        Gravity::SouthEast => (max_x, max_y),
    };

    let clamp = |value: i64, max: i64| value.clamp(0, max.max(0)) as i32;
    PlacementPosition::new(
        clamp(left + offset_x as i64, max_x),
        clamp(top + offset_y as i64, max_y),
    )
}

/// Size `overlay` should shrink to so it fits within `ratio` of `base` on
/// both axes, or `None` when it already fits.
pub fn fit_overlay(base: Dimensions, overlay: Dimensions, ratio: f64) -> Option<Dimensions> {
    let limit_w = base.width as f64 * ratio;
    let limit_h = base.height as f64 * ratio;
    if overlay.width as f64 <= limit_w && overlay.height as f64 <= limit_h {
        return None;
    }

    let scale = (limit_w / overlay.width.max(1) as f64).min(limit_h / overlay.height.max(1) as f64);
    Some(Dimensions::new(
        ((overlay.width as f64 * scale).floor() as u32).max(1),
        ((overlay.height as f64 * scale).floor() as u32).max(1),
    ))
}

/// Resize box for a logo: the base's short side times `scale`, applied to
/// the logo's longer side. The other side is left at 0 for the engine to
/// derive.
pub fn overlay_target(
    base: Dimensions,
    overlay: Dimensions,
    scale: f64,
) -> Result<(u32, u32), AppError> {
    if !(scale > 0.0 && scale <= 1.0) {
        return Err(AppError::invalid_argument(format!(
            "scale must be in (0, 1], got {}",
            scale
        )));
    }

    let target = (base.short_side() as f64 * scale) as u32;
    if target == 0 {
        return Err(AppError::invalid_argument(format!(
            "scale {} is too small for a {}x{} image",
            scale, base.width, base.height
        )));
    }

    if overlay.width >= overlay.height {
        Ok((target, 0))
    } else {
        Ok((0, target))
    }
}
