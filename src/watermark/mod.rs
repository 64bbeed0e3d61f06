//! Watermark building blocks: colors, geometry, fonts and text rendering.
//!
//! Text overlays have two rendering strategies behind [`TextRasterizer`]:
//! the glyph rasterizer (preferred) and the external label renderer, used
//! only as a degraded fallback when the default font asset is missing.

pub mod color;
pub mod font;
pub mod position;
pub mod text_renderer;

use tracing::warn;

use crate::external::{self, MagickLabelRasterizer};

pub use color::{apply_opacity, parse_color, Color};
pub use font::{FontSelector, DEFAULT_FONT_NAME};
pub use position::{fit_overlay, overlay_target, place, Gravity, AUTO_FIT_RATIO};
pub use text_renderer::{
    stroke_offsets, GlyphRasterizer, StrokeMode, TextRasterizer, TextWatermarkSpec,
};

/// Pick the text rendering strategy for `spec`.
///
/// The external renderer is chosen only when the default font is requested
/// but unavailable, `allow_fallback` is set, and the tool is installed.
/// Otherwise the glyph rasterizer is used and reports its own font errors.
pub fn select_rasterizer(
    spec: &TextWatermarkSpec,
    allow_fallback: bool,
) -> Box<dyn TextRasterizer> {
    if spec.font.is_default() && allow_fallback && !font::default_font_available() {
        if let Some(tool) = external::find_convert_tool() {
            warn!(
                tool = %tool.display(),
                "default font unavailable, rendering text with external tool"
            );
            return Box::new(MagickLabelRasterizer::new(tool));
        }
    }
    Box::new(GlyphRasterizer)
}
