//! Format conversion, including multi-resolution ICO packaging.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::engine::{EngineFormat, ProcessOptions, RasterEngine};
use crate::error::AppError;
use crate::external;

use super::format::{self, DEFAULT_ICO_SIZES, ICO};
use super::output::{resolve_output, ConflictPolicy, OutputSpec};
use super::{read_source, require_engine_output, write_output};

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Target format token; inferred from the output when unset
    pub format: Option<String>,
    /// Encoder quality, <= 0 for the encoder default
    pub quality: i32,
    pub overwrite: bool,
    pub conflict: ConflictPolicy,
    /// ICO sizes, largest first; `None` for the default set
    pub ico_sizes: Option<Vec<u32>>,
}

pub fn convert(
    engine: &dyn RasterEngine,
    input: &Path,
    output: &str,
    options: &ConvertOptions,
) -> Result<PathBuf, AppError> {
    let source = read_source(engine, input)?;

    let resolved = resolve_output(
        &OutputSpec::new(input, output)
            .desired_format(options.format.as_deref())
            .input_format(source.token)
            .conflict(options.conflict, options.overwrite),
    )?;

    if resolved.format == ICO {
        let sizes = options
            .ico_sizes
            .clone()
            .unwrap_or_else(|| DEFAULT_ICO_SIZES.to_vec());
        let png = engine.process(&source.data, &ProcessOptions::encode_as(EngineFormat::Png))?;
        external::convert_to_ico(&png, &resolved.path, &sizes)?;
        debug!(
            input = %input.display(),
            output = %resolved.path.display(),
            sizes = %format::ico_sizes_csv(&sizes),
            "packaged ico"
        );
        return Ok(resolved.path);
    }

    let target = require_engine_output(engine, &resolved.format)?;
    let mut process = ProcessOptions::encode_as(target);
    if options.quality > 0 {
        process.quality = Some(options.quality.min(100) as u8);
    }

    let data = engine.process(&source.data, &process)?;
    debug!(
        input = %input.display(),
        output = %resolved.path.display(),
        format = %resolved.format,
        quality = options.quality,
        "converted"
    );
    write_output(&resolved.path, &data)?;
    Ok(resolved.path)
}
