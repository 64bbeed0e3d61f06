//! Format registry
//!
//! Canonical format tokens and their mapping to engine formats. Canonical
//! tokens are lowercase without a leading dot, with `jpeg` folded into
//! `jpg`, `tif` into `tiff` and `heic` into `heif`.
//!
//! `ico` is a pseudo-format: the engine never sees it, packaging goes
//! through the external conversion tool instead.

use std::collections::BTreeSet;

use crate::engine::EngineFormat;
use crate::error::AppError;

/// Pseudo-format handled by the external tool.
pub const ICO: &str = "ico";

/// Sizes an ICO container may carry.
pub const ALLOWED_ICO_SIZES: [u32; 6] = [16, 32, 48, 64, 128, 256];

/// Sizes used when none are requested, largest first.
pub const DEFAULT_ICO_SIZES: [u32; 6] = [256, 128, 64, 48, 32, 16];

/// Canonicalize a format token.
pub fn normalize(token: &str) -> String {
    let lowered = token.trim().to_lowercase();
    let stripped = lowered.strip_prefix('.').unwrap_or(&lowered);
    match stripped {
        "jpeg" => "jpg".to_string(),
        "tif" => "tiff".to_string(),
        "heic" => "heif".to_string(),
        other => other.to_string(),
    }
}

/// Map a canonical token to the engine's format.
pub fn to_engine_type(canonical: &str) -> Result<EngineFormat, AppError> {
    match canonical {
        "jpg" => Ok(EngineFormat::Jpeg),
        "png" => Ok(EngineFormat::Png),
        "webp" => Ok(EngineFormat::WebP),
        "gif" => Ok(EngineFormat::Gif),
        "tiff" => Ok(EngineFormat::Tiff),
        "pdf" => Ok(EngineFormat::Pdf),
        "heif" => Ok(EngineFormat::Heif),
        "avif" => Ok(EngineFormat::Avif),
        "svg" => Ok(EngineFormat::Svg),
        other => Err(AppError::unsupported_format(format!(
            "unknown format: {}",
            other
        ))),
    }
}

/// Canonical token for an engine format.
pub fn from_engine_type(format: EngineFormat) -> &'static str {
    match format {
        EngineFormat::Jpeg => "jpg",
        EngineFormat::Png => "png",
        EngineFormat::WebP => "webp",
        EngineFormat::Gif => "gif",
        EngineFormat::Tiff => "tiff",
        EngineFormat::Pdf => "pdf",
        EngineFormat::Heif => "heif",
        EngineFormat::Avif => "avif",
        EngineFormat::Svg => "svg",
    }
}

/// Parse a comma-separated ICO size list.
///
/// Returns `None` for empty input so the caller can apply
/// [`DEFAULT_ICO_SIZES`]. The result is deduplicated and ordered largest
/// first, which is what multi-resolution packaging expects.
pub fn parse_ico_sizes(csv: &str) -> Result<Option<Vec<u32>>, AppError> {
    if csv.trim().is_empty() {
        return Ok(None);
    }

    let mut sizes = BTreeSet::new();
    for token in csv.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let size: u32 = token
            .parse()
            .map_err(|_| AppError::invalid_argument(format!("invalid ico size: {}", token)))?;
        if !ALLOWED_ICO_SIZES.contains(&size) {
            return Err(AppError::invalid_argument(format!(
                "ico size {} not allowed (use 16,32,48,64,128,256)",
                size
            )));
        }
        sizes.insert(size);
    }

    if sizes.is_empty() {
        return Err(AppError::invalid_argument("ico size list is empty"));
    }
    Ok(Some(sizes.into_iter().rev().collect()))
}

/// Render sizes the way the external tool expects them.
pub fn ico_sizes_csv(sizes: &[u32]) -> String {
    sizes
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_normalize_aliases() {
        assert_eq!(normalize("JPEG"), "jpg");
        assert_eq!(normalize(".Tif"), "tiff");
        assert_eq!(normalize(" heic "), "heif");
        assert_eq!(normalize("png"), "png");
    }

    #[test]
    fn test_to_engine_type_rejects_unknown() {
        let err = to_engine_type("bmp").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        assert!(to_engine_type(ICO).is_err());
    }

    #[test]
    fn test_parse_ico_sizes_empty_means_default() {
        assert_eq!(parse_ico_sizes("").unwrap(), None);
        assert_eq!(parse_ico_sizes("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_ico_sizes_rejects_bad_tokens() {
        for bad in ["12", "abc", "16,300", ",,"] {
            let err = parse_ico_sizes(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{}", bad);
        }
    }

    #[test]
    fn test_ico_sizes_csv() {
        assert_eq!(ico_sizes_csv(&DEFAULT_ICO_SIZES), "256,128,64,48,32,16");
    }
}
