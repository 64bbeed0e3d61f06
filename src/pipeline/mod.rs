//! Image transformation pipeline
//!
//! Each operation reads the source, resolves an output target, asks the
//! raster engine for the transform and writes the result. Operations take
//! the engine as `&dyn RasterEngine` and return the final output path.

pub mod compress;
pub mod convert;
pub mod format;
pub mod output;
pub mod resize;
pub mod rotate;
pub mod watermark;

use std::path::Path;

use crate::engine::{EngineFormat, RasterEngine};
use crate::error::AppError;

pub use compress::{compress, parse_size_bytes, CompressOptions, CompressionBudget};
pub use convert::{convert, ConvertOptions};
pub use output::{resolve_output, ConflictPolicy, OutputSpec, ResolvedOutput};
pub use resize::{resize, ResizeOptions};
pub use rotate::{rotate, RotateOptions};
pub use watermark::{watermark, WatermarkOptions};

/// A source image read from disk.
#[derive(Debug, Clone)]
pub struct Source {
    pub data: Vec<u8>,
    pub format: EngineFormat,
    /// Canonical format token
    pub token: &'static str,
}

/// Read and probe an input file.
pub fn read_source(engine: &dyn RasterEngine, path: &Path) -> Result<Source, AppError> {
    let data = std::fs::read(path).map_err(|e| {
        AppError::invalid_input(format!("cannot read {}", path.display())).with_source(e)
    })?;

    let format = engine.probe(&data).ok_or_else(|| {
        AppError::unsupported_format(format!("unrecognized image format: {}", path.display()))
    })?;
    if !engine.supports_load(format) {
        return Err(AppError::unsupported_format(format!(
            "{} input is not supported: {}",
            format::from_engine_type(format),
            path.display()
        )));
    }

    Ok(Source {
        data,
        format,
        token: format::from_engine_type(format),
    })
}

/// Map an output token to an engine format the engine can write.
pub fn require_engine_output(
    engine: &dyn RasterEngine,
    token: &str,
) -> Result<EngineFormat, AppError> {
    let format = format::to_engine_type(token)?;
    if !engine.supports_save(format) {
        return Err(AppError::unsupported_format(format!(
            "{} output is not supported",
            token
        )));
    }
    Ok(format)
}

pub fn write_output(path: &Path, data: &[u8]) -> Result<(), AppError> {
    std::fs::write(path, data)
        .map_err(|e| AppError::config(format!("cannot write {}", path.display())).with_source(e))
}
