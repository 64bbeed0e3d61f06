//! Resize operation and its option parsing.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::engine::{ProcessOptions, RasterEngine, ResizeMode, ResizeRequest};
use crate::error::AppError;

use super::output::{resolve_output, ConflictPolicy, OutputSpec};
use super::{read_source, require_engine_output, write_output};

#[derive(Debug, Clone)]
pub struct ResizeOptions {
    /// Pixels or percentage of the source width, empty for auto
    pub width: String,
    /// Pixels or percentage of the source height, empty for auto
    pub height: String,
    /// cover|outside, contain|inside, fill, or empty
    pub fit: String,
    pub without_enlargement: bool,
    pub keep_ratio: bool,
    pub conflict: ConflictPolicy,
    pub overwrite: bool,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            width: String::new(),
            height: String::new(),
            fit: String::new(),
            without_enlargement: true,
            keep_ratio: true,
            conflict: ConflictPolicy::Skip,
            overwrite: false,
        }
    }
}

/// Parse a dimension token against the source size on that axis.
///
/// `""` is 0 (auto), `N%` is a share of `base`, anything else must be a
/// positive integer.
pub fn parse_dimension(token: &str, base: u32) -> Result<u32, AppError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(0);
    }

    if let Some(percent) = token.strip_suffix('%') {
        let value: f64 = percent
            .trim()
            .parse()
            .map_err(|_| AppError::invalid_argument(format!("invalid dimension: {}", token)))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(AppError::invalid_argument(format!(
                "percentage must be greater than zero: {}",
                token
            )));
        }
        return Ok((base as f64 * value / 100.0).round() as u32);
    }

    match token.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(AppError::invalid_argument(format!(
            "dimension must be a positive integer or percentage: {}",
            token
        ))),
    }
}

/// Map a fit keyword to an engine resize mode.
pub fn parse_fit(fit: &str) -> Result<ResizeMode, AppError> {
    match fit.trim().to_lowercase().as_str() {
        "" => Ok(ResizeMode::Default),
        "cover" | "outside" => Ok(ResizeMode::Crop),
        "contain" | "inside" => Ok(ResizeMode::Embed),
        "fill" => Ok(ResizeMode::Force),
        other => Err(AppError::invalid_argument(format!(
            "unknown fit '{}' (use cover, contain, fill, inside or outside)",
            other
        ))),
    }
}

/// Build the engine request for a source of the given size.
pub fn plan_resize(
    options: &ResizeOptions,
    source_width: u32,
    source_height: u32,
) -> Result<ResizeRequest, AppError> {
    let width = parse_dimension(&options.width, source_width)?;
    let height = parse_dimension(&options.height, source_height)?;
    if width == 0 && height == 0 {
        return Err(AppError::invalid_argument(
            "resize needs a width or a height",
        ));
    }

    let mode = if options.keep_ratio {
        parse_fit(&options.fit)?
    } else {
        ResizeMode::Force
    };

    Ok(ResizeRequest {
        width,
        height,
        mode,
        enlarge: !options.without_enlargement,
    })
}

pub fn resize(
    engine: &dyn RasterEngine,
    input: &Path,
    output: &str,
    options: &ResizeOptions,
) -> Result<PathBuf, AppError> {
    let source = read_source(engine, input)?;
    let dims = engine.dimensions(&source.data)?;
    let request = plan_resize(options, dims.width, dims.height)?;

    let resolved = resolve_output(
        &OutputSpec::new(input, output)
            .input_format(source.token)
            .conflict(options.conflict, options.overwrite),
    )?;
    let format = require_engine_output(engine, &resolved.format)?;

    let data = engine.process(
        &source.data,
        &ProcessOptions::encode_as(format).with_resize(request),
    )?;
    debug!(
        input = %input.display(),
        output = %resolved.path.display(),
        width = request.width,
        height = request.height,
        mode = ?request.mode,
        "resized"
    );
    write_output(&resolved.path, &data)?;
    Ok(resolved.path)
}
