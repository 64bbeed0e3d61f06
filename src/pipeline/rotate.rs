//! Right-angle rotation and mirroring.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::engine::{ProcessOptions, RasterEngine, Rotation};
use crate::error::AppError;

use super::output::{resolve_output, ConflictPolicy, OutputSpec};
use super::{read_source, require_engine_output, write_output};

#[derive(Debug, Clone, Default)]
pub struct RotateOptions {
    pub degrees: i32,
    /// Mirror left-right
    pub flip: bool,
    /// Mirror top-bottom
    pub flop: bool,
    pub conflict: ConflictPolicy,
    pub overwrite: bool,
}

/// Map degrees to a clockwise right-angle rotation.
pub fn parse_rotation(degrees: i32) -> Result<Rotation, AppError> {
    match degrees {
        0 => Ok(Rotation::None),
        90 | -270 => Ok(Rotation::Deg90),
        180 | -180 => Ok(Rotation::Deg180),
        270 | -90 => Ok(Rotation::Deg270),
        other => Err(AppError::invalid_argument(format!(
            "rotation must be a multiple of 90 between -270 and 270, got {}",
            other
        ))),
    }
}

pub fn rotate(
    engine: &dyn RasterEngine,
    input: &Path,
    output: &str,
    options: &RotateOptions,
) -> Result<PathBuf, AppError> {
    let rotation = parse_rotation(options.degrees)?;
    if rotation == Rotation::None && !options.flip && !options.flop {
        return Err(AppError::invalid_argument(
            "nothing to do: give degrees, --flip or --flop",
        ));
    }

    let source = read_source(engine, input)?;
    let resolved = resolve_output(
        &OutputSpec::new(input, output)
            .input_format(source.token)
            .conflict(options.conflict, options.overwrite),
    )?;
    let format = require_engine_output(engine, &resolved.format)?;

    let mut process = ProcessOptions::encode_as(format);
    process.rotation = rotation;
    process.flip = options.flip;
    process.flop = options.flop;

    let data = engine.process(&source.data, &process)?;
    debug!(
        input = %input.display(),
        output = %resolved.path.display(),
        degrees = options.degrees,
        flip = options.flip,
        flop = options.flop,
        "rotated"
    );
    write_output(&resolved.path, &data)?;
    Ok(resolved.path)
}
