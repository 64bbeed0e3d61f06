//! Turns parsed flags plus configuration into validated pipeline options.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::engine::RasterEngine;
use crate::error::AppError;
use crate::pipeline::{
    self, format::parse_ico_sizes, parse_size_bytes, rotate::parse_rotation, CompressOptions,
    ConvertOptions, ResizeOptions, RotateOptions, WatermarkOptions,
};

use super::args::{CompressFlags, ConvertFlags, ResizeFlags, RotateFlags, WatermarkFlags};

/// One fully validated operation, ready to run on any number of inputs.
#[derive(Debug, Clone)]
pub enum Operation {
    Convert(ConvertOptions),
    Compress(CompressOptions),
    Resize(ResizeOptions),
    Rotate(RotateOptions),
    Watermark(WatermarkOptions),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Convert(_) => "convert",
            Self::Compress(_) => "compress",
            Self::Resize(_) => "resize",
            Self::Rotate(_) => "rotate",
            Self::Watermark(_) => "watermark",
        }
    }

    pub fn convert(flags: &ConvertFlags, config: &Config) -> Result<Self, AppError> {
        let ico_sizes = match &flags.ico_sizes {
            Some(csv) => parse_ico_sizes(csv)?,
            None => None,
        };
        Ok(Self::Convert(ConvertOptions {
            format: flags.format.clone().filter(|f| !f.trim().is_empty()),
            quality: flags.quality,
            overwrite: flags.overwrite || config.base.overwrite,
            conflict: config.base.conflict,
            ico_sizes,
        }))
    }

    pub fn compress(flags: &CompressFlags, config: &Config) -> Result<Self, AppError> {
        let max_bytes = match &flags.max_size {
            Some(size) => parse_size_bytes(size)?,
            None => 0,
        };
        Ok(Self::Compress(CompressOptions {
            quality: flags.quality,
            max_bytes,
            aggressive: flags.aggressive,
            default_quality: config.compress.default_quality,
            max_width: config.compress.max_width,
            max_height: config.compress.max_height,
            conflict: config.base.conflict,
            overwrite: config.base.overwrite,
        }))
    }

    pub fn resize(flags: &ResizeFlags, config: &Config) -> Result<Self, AppError> {
        if flags.width.trim().is_empty() && flags.height.trim().is_empty() {
            return Err(AppError::invalid_argument(
                "resize needs --width, --height or both",
            ));
        }
        pipeline::resize::parse_dimension(&flags.width, 1)?;
        pipeline::resize::parse_dimension(&flags.height, 1)?;
        pipeline::resize::parse_fit(&flags.fit)?;
        Ok(Self::Resize(ResizeOptions {
            width: flags.width.clone(),
            height: flags.height.clone(),
            fit: flags.fit.clone(),
            without_enlargement: flags.without_enlargement,
            keep_ratio: flags.keep_ratio,
            conflict: config.base.conflict,
            overwrite: config.base.overwrite,
        }))
    }

    pub fn rotate(flags: &RotateFlags, config: &Config) -> Result<Self, AppError> {
        parse_rotation(flags.degrees)?;
        Ok(Self::Rotate(RotateOptions {
            degrees: flags.degrees,
            flip: flags.flip,
            flop: flags.flop,
            conflict: config.base.conflict,
            overwrite: config.base.overwrite,
        }))
    }

    pub fn watermark(flags: &WatermarkFlags, config: &Config) -> Result<Self, AppError> {
        let defaults = &config.watermark;
        let options = WatermarkOptions {
            logo: flags.logo.clone(),
            text: flags.text.clone(),
            opacity: flags.opacity.unwrap_or(defaults.default_opacity),
            scale: flags.scale.unwrap_or(defaults.default_scale),
            gravity: flags
                .gravity
                .clone()
                .unwrap_or_else(|| defaults.default_gravity.clone()),
            offset_x: flags.offset_x.unwrap_or(defaults.default_offset_x),
            offset_y: flags.offset_y.unwrap_or(defaults.default_offset_y),
            font_size: flags.font_size.unwrap_or(defaults.default_font_size),
            font: flags
                .font
                .clone()
                .unwrap_or_else(|| defaults.default_font.clone()),
            font_file: flags
                .font_file
                .clone()
                .unwrap_or_else(|| defaults.default_font_file.clone()),
            color: flags
                .color
                .clone()
                .unwrap_or_else(|| defaults.default_color.clone()),
            stroke_color: flags
                .stroke_color
                .clone()
                .unwrap_or_else(|| defaults.default_stroke_color.clone()),
            stroke_width: flags.stroke_width.unwrap_or(defaults.default_stroke_width),
            stroke_mode: flags
                .stroke_mode
                .clone()
                .unwrap_or_else(|| defaults.default_stroke_mode.clone()),
            background: flags
                .background
                .clone()
                .unwrap_or_else(|| defaults.default_background.clone()),
            text_fallback: defaults.text_fallback,
            conflict: config.base.conflict,
            overwrite: config.base.overwrite,
        };
        options.validate()?;
        Ok(Self::Watermark(options))
    }

    /// Run on one input.
    pub fn apply(
        &self,
        engine: &dyn RasterEngine,
        input: &Path,
        output: &str,
    ) -> Result<PathBuf, AppError> {
        match self {
            Self::Convert(options) => pipeline::convert(engine, input, output, options),
            Self::Compress(options) => pipeline::compress(engine, input, output, options),
            Self::Resize(options) => pipeline::resize(engine, input, output, options),
            Self::Rotate(options) => pipeline::rotate(engine, input, output, options),
            Self::Watermark(options) => pipeline::watermark(engine, input, output, options),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pipeline::ConflictPolicy;
    use rstest::rstest;

    #[test]
    fn test_watermark_falls_back_to_config() {
        let mut config = Config::default();
        config.watermark.default_gravity = "northwest".into();
        config.watermark.default_opacity = 0.7;
        config.base.conflict = ConflictPolicy::Rename;

        let flags = WatermarkFlags {
            text: Some("hi".into()),
            opacity: Some(0.9),
            ..WatermarkFlags::default()
        };
        match Operation::watermark(&flags, &config).unwrap() {
            Operation::Watermark(options) => {
                assert_eq!(options.gravity, "northwest");
                assert_eq!(options.opacity, 0.9);
                assert_eq!(options.stroke_mode, "circle");
                assert_eq!(options.conflict, ConflictPolicy::Rename);
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[test]
    fn test_watermark_validation_is_up_front() {
        let flags = WatermarkFlags::default();
        let err = Operation::watermark(&flags, &Config::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_bad_size_is_rejected_before_running() {
        let flags = CompressFlags {
            max_size: Some("lots".into()),
            ..CompressFlags::default()
        };
        let err = Operation::compress(&flags, &Config::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_compress_uses_config_caps() {
        let flags = CompressFlags {
            max_size: Some("1.5KB".into()),
            ..CompressFlags::default()
        };
        match Operation::compress(&flags, &Config::default()).unwrap() {
            Operation::Compress(options) => {
                assert_eq!(options.max_bytes, 1536);
                assert_eq!(options.default_quality, 85);
                assert_eq!(options.max_width, 4096);
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[test]
    fn test_convert_parses_ico_sizes() {
        let flags = ConvertFlags {
            ico_sizes: Some("32,256,32".into()),
            ..ConvertFlags::default()
        };
        match Operation::convert(&flags, &Config::default()).unwrap() {
            Operation::Convert(options) => {
                assert_eq!(options.ico_sizes, Some(vec![256, 32]));
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[test]
    fn test_resize_needs_a_dimension() {
        let err = Operation::resize(&ResizeFlags::default(), &Config::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[rstest]
    #[case("abc", "")]
    #[case("-5", "")]
    #[case("", "0")]
    #[case("", "-10%")]
    fn test_resize_rejects_malformed_dimensions(#[case] width: &str, #[case] height: &str) {
        let flags = ResizeFlags {
            width: width.into(),
            height: height.into(),
            ..ResizeFlags::default()
        };
        let err = Operation::resize(&flags, &Config::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_resize_accepts_percent_and_pixels() {
        let flags = ResizeFlags {
            width: "50%".into(),
            height: "300".into(),
            ..ResizeFlags::default()
        };
        assert!(Operation::resize(&flags, &Config::default()).is_ok());
    }
}
