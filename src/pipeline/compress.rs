//! Size-constrained compression
//!
//! Re-encodes the source at decreasing quality until the result fits the
//! byte budget or the quality floor is reached. Every candidate is encoded
//! from the original bytes, never from a previous lossy candidate.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::engine::{ProcessOptions, RasterEngine, ResizeMode, ResizeRequest};
use crate::error::AppError;

use super::output::{resolve_output, ConflictPolicy, OutputSpec};
use super::{read_source, require_engine_output, write_output};

/// Quality used when neither the caller nor the config gives one.
pub const FALLBACK_QUALITY: i32 = 85;

const STEP: i32 = 2;
const MIN_QUALITY: i32 = 10;
const AGGRESSIVE_STEP: i32 = 5;
const AGGRESSIVE_MIN_QUALITY: i32 = 5;

/// Byte budget for one compression run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressionBudget {
    /// 0 means unbounded
    pub target_max_bytes: u64,
    /// Values <= 0 select the default quality
    pub starting_quality: i32,
    pub aggressive: bool,
}

impl CompressionBudget {
    pub fn step(&self) -> i32 {
        if self.aggressive {
            AGGRESSIVE_STEP
        } else {
            STEP
        }
    }

    pub fn min_quality(&self) -> i32 {
        if self.aggressive {
            AGGRESSIVE_MIN_QUALITY
        } else {
            MIN_QUALITY
        }
    }

    fn initial_quality(&self, default_quality: i32) -> i32 {
        let quality = if self.starting_quality > 0 {
            self.starting_quality
        } else if default_quality > 0 {
            default_quality
        } else {
            FALLBACK_QUALITY
        };
        quality.clamp(1, 100)
    }
}

/// Best candidate found by the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionOutcome {
    pub data: Vec<u8>,
    pub quality: i32,
}

/// Run the quality search.
///
/// `options` carries everything except quality, which the search sets on
/// each attempt. A budget that cannot be met at the floor is not an error:
/// the floor-quality candidate is returned.
pub fn compress_to_budget(
    engine: &dyn RasterEngine,
    source: &[u8],
    options: &ProcessOptions,
    budget: &CompressionBudget,
    default_quality: i32,
) -> Result<CompressionOutcome, AppError> {
    let floor = budget.min_quality();
    let mut quality = budget.initial_quality(default_quality);

    let encode = |quality: i32| {
        let mut attempt = options.clone();
        attempt.quality = Some(quality as u8);
        engine.process(source, &attempt)
    };

    let mut data = encode(quality)?;
    debug!(quality, size = data.len(), "initial encode");

    if budget.target_max_bytes == 0 {
        return Ok(CompressionOutcome { data, quality });
    }

    while data.len() as u64 > budget.target_max_bytes && quality > floor {
        quality = (quality - budget.step()).max(floor);
        data = encode(quality)?;
        debug!(quality, size = data.len(), target = budget.target_max_bytes, "re-encoded");
    }

    Ok(CompressionOutcome { data, quality })
}

/// Parse a human size like `500KB`, `1.5MB` or `2048`.
///
/// Empty input means unbounded (0). Units are base 1024.
pub fn parse_size_bytes(text: &str) -> Result<u64, AppError> {
    let upper = text.trim().to_uppercase();
    if upper.is_empty() {
        return Ok(0);
    }

    let (number, multiplier) = if let Some(n) = upper.strip_suffix("KB") {
        (n, 1024u64)
    } else if let Some(n) = upper.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix('B') {
        (n, 1)
    } else {
        (upper.as_str(), 1)
    };

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| AppError::invalid_argument(format!("invalid size: {}", text.trim())))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::invalid_argument(format!(
            "size must be greater than zero: {}",
            text.trim()
        )));
    }
    Ok((value * multiplier as f64) as u64)
}

/// Options for the compress operation.
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// <= 0 selects `default_quality`
    pub quality: i32,
    pub max_bytes: u64,
    pub aggressive: bool,
    pub default_quality: i32,
    /// Cap on output width, 0 for none
    pub max_width: u32,
    /// Cap on output height, 0 for none
    pub max_height: u32,
    pub conflict: ConflictPolicy,
    pub overwrite: bool,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            quality: 0,
            max_bytes: 0,
            aggressive: false,
            default_quality: FALLBACK_QUALITY,
            max_width: 0,
            max_height: 0,
            conflict: ConflictPolicy::Skip,
            overwrite: false,
        }
    }
}

/// Compress `input` into `output`, keeping its format.
pub fn compress(
    engine: &dyn RasterEngine,
    input: &Path,
    output: &str,
    options: &CompressOptions,
) -> Result<PathBuf, AppError> {
    let source = read_source(engine, input)?;

    let resolved = resolve_output(
        &OutputSpec::new(input, output)
            .input_format(source.token)
            .conflict(options.conflict, options.overwrite),
    )?;
    let format = require_engine_output(engine, &resolved.format)?;

    let mut process = ProcessOptions::encode_as(format);
    if options.max_width > 0 || options.max_height > 0 {
        process.resize = Some(ResizeRequest {
            width: options.max_width,
            height: options.max_height,
            mode: ResizeMode::Default,
            enlarge: false,
        });
    }

    let budget = CompressionBudget {
        target_max_bytes: options.max_bytes,
        starting_quality: options.quality,
        aggressive: options.aggressive,
    };
    let outcome =
        compress_to_budget(engine, &source.data, &process, &budget, options.default_quality)?;

    debug!(
        input = %input.display(),
        output = %resolved.path.display(),
        format = %resolved.format,
        quality = outcome.quality,
        size = outcome.data.len(),
        "compressed"
    );
    write_output(&resolved.path, &outcome.data)?;
    Ok(resolved.path)
}
