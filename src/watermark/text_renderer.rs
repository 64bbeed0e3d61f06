//! Text watermark rendering.
//!
//! Renders text to a standalone PNG overlay with transparent (or painted)
//! background. Strokes are drawn as a halo: the glyphs are re-drawn in the
//! stroke color at a set of small offsets, then the fill pass goes on top.
//!
//! # Example
//!
//! ```ignore
//! use image_cli::watermark::text_renderer::{GlyphRasterizer, TextRasterizer, TextWatermarkSpec};
//!
//! let spec = TextWatermarkSpec {
//!     text: "© 2025".to_string(),
//!     stroke_width: 2,
//!     ..TextWatermarkSpec::default()
//! };
//! let png = GlyphRasterizer.render(&spec)?;
//! ```

use ab_glyph::{point, Font, FontArc, OutlinedGlyph, PxScale, ScaleFont};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::str::FromStr;
use tracing::debug;

use crate::engine::compositor::blend_pixels;
use crate::error::AppError;

use super::color::{parse_color, Color};
use super::font::FontSelector;

pub const DEFAULT_FONT_SIZE: u32 = 24;
pub const DEFAULT_OPACITY: f64 = 0.5;
/// Widest accepted stroke halo, in pixels.
pub const MAX_STROKE_WIDTH: u32 = 256;

/// Shape of the stroke halo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeMode {
    /// Every offset within the stroke radius
    #[default]
    Disc,
    /// Only the eight compass directions at each distance
    EightDirection,
}

impl FromStr for StrokeMode {
    type Err = std::convert::Infallible;

    /// `8dir` and `8` select eight-direction; anything else is a disc.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "8dir" | "8" => Ok(Self::EightDirection),
            _ => Ok(Self::Disc),
        }
    }
}

/// Pixel offsets at which the stroke pass is drawn.
///
/// Widths above [`MAX_STROKE_WIDTH`] are treated as the maximum.
pub fn stroke_offsets(width: u32, mode: StrokeMode) -> Vec<(i32, i32)> {
    let w = width.min(MAX_STROKE_WIDTH) as i32;
    let mut offsets = Vec::new();
    match mode {
        StrokeMode::EightDirection => {
            for i in 1..=w {
                offsets.extend_from_slice(&[
                    (i, 0),
                    (-i, 0),
                    (0, i),
                    (0, -i),
                    (i, i),
                    (-i, -i),
                    (i, -i),
                    (-i, i),
                ]);
            }
        }
        StrokeMode::Disc => {
            for dy in -w..=w {
                for dx in -w..=w {
                    let (x, y, r) = (i64::from(dx), i64::from(dy), i64::from(w));
                    if (dx, dy) != (0, 0) && x * x + y * y <= r * r {
                        offsets.push((dx, dy));
                    }
                }
            }
        }
    }
    offsets
}

/// Everything needed to render one text overlay.
#[derive(Debug, Clone)]
pub struct TextWatermarkSpec {
    pub text: String,
    /// Pixels, 0 for the default
    pub font_size: u32,
    pub font: FontSelector,
    pub color: String,
    pub stroke_color: String,
    pub stroke_width: u32,
    pub stroke_mode: StrokeMode,
    pub background: String,
    /// Out-of-range values fall back to 0.5
    pub opacity: f64,
}

impl Default for TextWatermarkSpec {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: DEFAULT_FONT_SIZE,
            font: FontSelector::Default,
            color: "white".to_string(),
            stroke_color: String::new(),
            stroke_width: 0,
            stroke_mode: StrokeMode::Disc,
            background: String::new(),
            opacity: DEFAULT_OPACITY,
        }
    }
}

impl TextWatermarkSpec {
    pub fn effective_font_size(&self) -> u32 {
        if self.font_size == 0 {
            DEFAULT_FONT_SIZE
        } else {
            self.font_size
        }
    }

    pub fn effective_opacity(&self) -> f64 {
        if self.opacity > 0.0 && self.opacity <= 1.0 {
            self.opacity
        } else {
            DEFAULT_OPACITY
        }
    }

    /// Fill color with opacity applied; unparseable is opaque white.
    pub fn fill(&self) -> Color {
        parse_color(&self.color)
            .unwrap_or_else(Color::white)
            .with_opacity(self.effective_opacity())
    }

    /// Stroke color with opacity applied; unparseable is opaque black.
    pub fn stroke(&self) -> Color {
        parse_color(&self.stroke_color)
            .unwrap_or_else(Color::black)
            .with_opacity(self.effective_opacity())
    }

    /// Background with opacity applied, `None` for transparent.
    pub fn background(&self) -> Option<Color> {
        parse_color(&self.background).map(|c| c.with_opacity(self.effective_opacity()))
    }
}

/// A way of turning a [`TextWatermarkSpec`] into an encoded overlay.
pub trait TextRasterizer {
    fn name(&self) -> &'static str;

    /// Render to PNG bytes.
    fn render(&self, spec: &TextWatermarkSpec) -> Result<Vec<u8>, AppError>;
}

/// Renders with `ab_glyph` from a loaded font.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlyphRasterizer;

impl TextRasterizer for GlyphRasterizer {
    fn name(&self) -> &'static str {
        "glyph"
    }

    fn render(&self, spec: &TextWatermarkSpec) -> Result<Vec<u8>, AppError> {
        if spec.text.is_empty() {
            return Err(AppError::invalid_argument("watermark text is empty"));
        }
        check_stroke_width(spec.stroke_width)?;
        let font = spec.font.load()?;
        let canvas = render_canvas(&font, spec);
        debug!(
            width = canvas.width(),
            height = canvas.height(),
            "rendered text overlay"
        );

        let mut buffer = Cursor::new(Vec::new());
        canvas
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| AppError::config("cannot encode text overlay").with_source(e))?;
        Ok(buffer.into_inner())
    }
}

pub fn check_stroke_width(width: u32) -> Result<(), AppError> {
    if width > MAX_STROKE_WIDTH {
        return Err(AppError::invalid_argument(format!(
            "stroke width must be at most {}, got {}",
            MAX_STROKE_WIDTH, width
        )));
    }
    Ok(())
}

/// Lay glyphs out on a baseline at y = 0. Returns the outlines and the
/// total advance.
fn layout(font: &FontArc, scale: PxScale, text: &str) -> (Vec<OutlinedGlyph>, f32) {
    let scaled = font.as_scaled(scale);
    let mut cursor_x = 0.0f32;
    let mut prev: Option<ab_glyph::GlyphId> = None;
    let mut glyphs = Vec::new();

    for c in text.chars().filter(|c| !c.is_control()) {
        let glyph_id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            cursor_x += scaled.kern(prev, glyph_id);
        }
        let glyph = glyph_id.with_scale_and_position(scale, point(cursor_x, 0.0));
        cursor_x += scaled.h_advance(glyph_id);
        prev = Some(glyph_id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            glyphs.push(outlined);
        }
    }
    (glyphs, cursor_x)
}

/// Tight pixel bounds `(min_x, min_y, max_x, max_y)` of the laid-out text.
fn text_bounds(font: &FontArc, scale: PxScale, glyphs: &[OutlinedGlyph], advance: f32) -> (i32, i32, i32, i32) {
    if glyphs.is_empty() {
        // Whitespace only: use the advance box.
        let scaled = font.as_scaled(scale);
        return (
            0,
            -scaled.ascent().ceil() as i32,
            advance.ceil() as i32,
            -scaled.descent().floor() as i32,
        );
    }

    glyphs.iter().fold(
        (i32::MAX, i32::MAX, i32::MIN, i32::MIN),
        |(min_x, min_y, max_x, max_y), g| {
            let b = g.px_bounds();
            (
                min_x.min(b.min.x.floor() as i32),
                min_y.min(b.min.y.floor() as i32),
                max_x.max(b.max.x.ceil() as i32),
                max_y.max(b.max.y.ceil() as i32),
            )
        },
    )
}

fn render_canvas(font: &FontArc, spec: &TextWatermarkSpec) -> RgbaImage {
    let scale = PxScale::from(spec.effective_font_size() as f32);
    let (glyphs, advance) = layout(font, scale, &spec.text);
    let (min_x, min_y, max_x, max_y) = text_bounds(font, scale, &glyphs, advance);

    let padding = spec.stroke_width.min(MAX_STROKE_WIDTH) as i32 + 4;
    let width = ((max_x - min_x) + padding * 2).max(1) as u32;
    let height = ((max_y - min_y) + padding * 2).max(1) as u32;

    let mut canvas = match spec.background() {
        Some(bg) => RgbaImage::from_pixel(width, height, bg.to_rgba()),
        None => RgbaImage::new(width, height),
    };

    let shift_x = padding - min_x;
    let shift_y = padding - min_y;

    if spec.stroke_width > 0 {
        let stroke = spec.stroke();
        for (dx, dy) in stroke_offsets(spec.stroke_width, spec.stroke_mode) {
            draw_glyphs(&mut canvas, &glyphs, shift_x + dx, shift_y + dy, stroke);
        }
    }
    draw_glyphs(&mut canvas, &glyphs, shift_x, shift_y, spec.fill());

    canvas
}

fn draw_glyphs(canvas: &mut RgbaImage, glyphs: &[OutlinedGlyph], shift_x: i32, shift_y: i32, color: Color) {
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);
    for glyph in glyphs {
        let bounds = glyph.px_bounds();
        let origin_x = bounds.min.x as i32 + shift_x;
        let origin_y = bounds.min.y as i32 + shift_y;

        glyph.draw(|px, py, coverage| {
            let x = origin_x + px as i32;
            let y = origin_y + py as i32;
            if x < 0 || y < 0 || x >= width || y >= height {
                return;
            }
            let alpha = (color.a as f32 * coverage.clamp(0.0, 1.0)).round() as u8;
            let pixel = Rgba([color.r, color.g, color.b, alpha]);
            let existing = *canvas.get_pixel(x as u32, y as u32);
            canvas.put_pixel(x as u32, y as u32, blend_pixels(existing, pixel, 1.0));
        });
    }
}
