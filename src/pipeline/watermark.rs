//! Logo and text watermarks.
//!
//! The overlay is built first (rendered text or a resized logo), shrunk if
//! it would cover more than 90% of the base on either axis, placed by
//! gravity and finally composited by the engine.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::engine::{
    Dimensions, EngineFormat, Overlay, ProcessOptions, RasterEngine, ResizeMode, ResizeRequest,
};
use crate::error::AppError;
use crate::watermark::{
    fit_overlay, overlay_target, place, select_rasterizer, FontSelector, Gravity, StrokeMode,
    TextWatermarkSpec, AUTO_FIT_RATIO,
};
use crate::watermark::text_renderer::check_stroke_width;

use super::output::{resolve_output, ConflictPolicy, OutputSpec};
use super::{read_source, require_engine_output, write_output};

#[derive(Debug, Clone)]
pub struct WatermarkOptions {
    /// Image overlay; exclusive with `text`
    pub logo: Option<PathBuf>,
    pub text: Option<String>,
    pub opacity: f64,
    /// Logo size as a share of the base's short side
    pub scale: f64,
    pub gravity: String,
    pub offset_x: i32,
    pub offset_y: i32,
    pub font_size: u32,
    pub font: String,
    pub font_file: String,
    pub color: String,
    pub stroke_color: String,
    pub stroke_width: u32,
    pub stroke_mode: String,
    pub background: String,
    /// Allow the external label renderer when the default font is missing
    pub text_fallback: bool,
    pub conflict: ConflictPolicy,
    pub overwrite: bool,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            logo: None,
            text: None,
            opacity: 0.5,
            scale: 0.2,
            gravity: "southeast".to_string(),
            offset_x: 0,
            offset_y: 0,
            font_size: 24,
            font: String::new(),
            font_file: String::new(),
            color: "white".to_string(),
            stroke_color: String::new(),
            stroke_width: 0,
            stroke_mode: String::new(),
            background: String::new(),
            text_fallback: true,
            conflict: ConflictPolicy::Skip,
            overwrite: false,
        }
    }
}

enum OverlaySource<'a> {
    Text(&'a str),
    Logo(&'a Path),
}

impl WatermarkOptions {
    fn overlay_source(&self) -> Result<OverlaySource<'_>, AppError> {
        let text = self.text.as_deref().filter(|t| !t.is_empty());
        match (text, self.logo.as_deref()) {
            (Some(_), Some(_)) => Err(AppError::invalid_argument(
                "--text and --logo cannot be used together",
            )),
            (Some(text), None) => Ok(OverlaySource::Text(text)),
            (None, Some(logo)) => Ok(OverlaySource::Logo(logo)),
            (None, None) => Err(AppError::invalid_argument(
                "a watermark needs --text or --logo",
            )),
        }
    }

    /// Check the flags that do not depend on any input file.
    ///
    /// Batch runs call this once before touching the first item.
    pub fn validate(&self) -> Result<Gravity, AppError> {
        let source = self.overlay_source()?;
        if !(self.opacity > 0.0 && self.opacity <= 1.0) {
            return Err(AppError::invalid_argument(format!(
                "opacity must be in (0, 1], got {}",
                self.opacity
            )));
        }
        if let OverlaySource::Text(_) = source {
            check_stroke_width(self.stroke_width)?;
        }
        if let OverlaySource::Logo(_) = source {
            if !(self.scale > 0.0 && self.scale <= 1.0) {
                return Err(AppError::invalid_argument(format!(
                    "scale must be in (0, 1], got {}",
                    self.scale
                )));
            }
        }
        self.gravity.parse()
    }

    /// Text spec with the fill, stroke and background opacity baked in.
    pub fn text_spec(&self, text: &str) -> TextWatermarkSpec {
        TextWatermarkSpec {
            text: text.to_string(),
            font_size: self.font_size,
            font: FontSelector::resolve(&self.font_file, &self.font),
            color: self.color.clone(),
            stroke_color: self.stroke_color.clone(),
            stroke_width: self.stroke_width,
            stroke_mode: self.stroke_mode.parse::<StrokeMode>().unwrap_or_default(),
            background: self.background.clone(),
            opacity: self.opacity,
        }
    }
}

/// Resize a logo so its longer side is `scale` of the base's short side.
fn sized_logo(
    engine: &dyn RasterEngine,
    path: &Path,
    base: Dimensions,
    scale: f64,
) -> Result<Vec<u8>, AppError> {
    let data = std::fs::read(path).map_err(|e| {
        AppError::invalid_input(format!("cannot read logo {}", path.display())).with_source(e)
    })?;
    let logo = engine.dimensions(&data)?;
    let (width, height) = overlay_target(base, logo, scale)?;

    engine.process(
        &data,
        &ProcessOptions::encode_as(EngineFormat::Png).with_resize(ResizeRequest {
            width,
            height,
            mode: ResizeMode::Default,
            enlarge: true,
        }),
    )
}

pub fn watermark(
    engine: &dyn RasterEngine,
    input: &Path,
    output: &str,
    options: &WatermarkOptions,
) -> Result<PathBuf, AppError> {
    let gravity = options.validate()?;

    let source = read_source(engine, input)?;
    let resolved = resolve_output(
        &OutputSpec::new(input, output)
            .input_format(source.token)
            .conflict(options.conflict, options.overwrite),
    )?;
    let format = require_engine_output(engine, &resolved.format)?;
    let base = engine.dimensions(&source.data)?;

    // Text colors already carry the opacity.
    let (mut overlay, opacity) = match options.overlay_source()? {
        OverlaySource::Text(text) => {
            let spec = options.text_spec(text);
            let rasterizer = select_rasterizer(&spec, options.text_fallback);
            debug!(rasterizer = rasterizer.name(), "rendering text overlay");
            (rasterizer.render(&spec)?, 1.0)
        }
        OverlaySource::Logo(path) => (
            sized_logo(engine, path, base, options.scale)?,
            options.opacity as f32,
        ),
    };

    let mut size = engine.dimensions(&overlay)?;
    if let Some(fitted) = fit_overlay(base, size, AUTO_FIT_RATIO) {
        overlay = engine.process(
            &overlay,
            &ProcessOptions::encode_as(EngineFormat::Png).with_resize(ResizeRequest {
                width: fitted.width,
                height: fitted.height,
                mode: ResizeMode::Force,
                enlarge: false,
            }),
        )?;
        debug!(from = ?size, to = ?fitted, "overlay shrunk to fit");
        size = fitted;
    }

    let position = place(base, size, gravity, options.offset_x, options.offset_y);
    let mut process = ProcessOptions::encode_as(format);
    process.overlay = Some(Overlay {
        data: overlay,
        left: position.x,
        top: position.y,
        opacity,
    });

    let data = engine.process(&source.data, &process)?;
    debug!(
        input = %input.display(),
        output = %resolved.path.display(),
        gravity = gravity.as_str(),
        left = position.x,
        top = position.y,
        "watermarked"
    );
    write_output(&resolved.path, &data)?;
    Ok(resolved.path)
}
