//! External ImageMagick tool: lookup, ICO packaging, ICO measurement and
//! the fallback label renderer.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

use crate::error::AppError;
use crate::pipeline::format::ico_sizes_csv;
use crate::pipeline::output::ensure_parent_dir;
use crate::watermark::font::FontSelector;
use crate::watermark::text_renderer::{TextRasterizer, TextWatermarkSpec};

const TEMP_PREFIX: &str = "image-cli-ico-";

/// `magick`, else the legacy `convert`.
pub fn find_convert_tool() -> Option<PathBuf> {
    which::which("magick")
        .or_else(|_| which::which("convert"))
        .ok()
}

pub fn has_convert_tool() -> bool {
    find_convert_tool().is_some()
}

/// `magick identify`, else the legacy `identify`. Returns the program and
/// the leading arguments.
pub fn find_identify_tool() -> Option<(PathBuf, Vec<&'static str>)> {
    if let Ok(path) = which::which("magick") {
        return Some((path, vec!["identify"]));
    }
    which::which("identify").ok().map(|path| (path, Vec::new()))
}

fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text.trim().to_string()
}

/// Package PNG bytes into a multi-resolution ICO at `out`.
///
/// The PNG is staged in a scratch directory that is removed on every exit
/// path.
pub fn convert_to_ico(png: &[u8], out: &Path, sizes: &[u32]) -> Result<(), AppError> {
    let tool = find_convert_tool().ok_or_else(|| {
        AppError::unsupported_format("ico output needs ImageMagick (magick or convert) on PATH")
    })?;
    ensure_parent_dir(out)?;

    let scratch = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempdir()
        .map_err(|e| AppError::config("cannot create scratch directory").with_source(e))?;
    let staged = scratch.path().join("input.png");
    std::fs::write(&staged, png)
        .map_err(|e| AppError::config("cannot stage ico source").with_source(e))?;

    let csv = ico_sizes_csv(sizes);
    debug!(tool = %tool.display(), sizes = %csv, output = %out.display(), "running ico packaging");

    let output = Command::new(&tool)
        .arg(&staged)
        .arg("-define")
        .arg(format!("icon:auto-resize={}", csv))
        .arg(out)
        .output()
        .map_err(|e| {
            AppError::config(format!("cannot run {}", tool.display())).with_source(e)
        })?;

    if !output.status.success() {
        let message = combined_output(&output);
        return Err(AppError::config(if message.is_empty() {
            format!("ico packaging failed ({})", output.status)
        } else {
            format!("ico packaging failed: {}", message)
        }));
    }
    Ok(())
}

/// Largest frame of `identify -format "%w %h\n"` output, by area.
pub fn parse_identify_output(output: &str) -> Option<(u32, u32)> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let width = fields.next()?.parse::<u32>().ok()?;
            let height = fields.next()?.parse::<u32>().ok()?;
            Some((width, height))
        })
        .filter(|(w, h)| *w as u64 * *h as u64 > 0)
        .max_by_key(|(w, h)| *w as u64 * *h as u64)
}

/// Dimensions of the largest frame in an ICO file.
pub fn read_ico_size(path: &Path) -> Result<(u32, u32), AppError> {
    let (tool, prefix) = find_identify_tool().ok_or_else(|| {
        AppError::unsupported_format("reading ico needs ImageMagick (magick or identify) on PATH")
    })?;

    let output = Command::new(&tool)
        .args(&prefix)
        .arg("-format")
        .arg("%w %h\n")
        .arg(path)
        .output()
        .map_err(|e| {
            AppError::invalid_input(format!("cannot run {}", tool.display())).with_source(e)
        })?;
    if !output.status.success() {
        return Err(AppError::invalid_input(format!(
            "cannot read ico {}: {}",
            path.display(),
            combined_output(&output)
        )));
    }

    parse_identify_output(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        AppError::invalid_input(format!("cannot read ico sizes: {}", path.display()))
    })
}

/// Renders text with the tool's `label:` coder. Used only when the glyph
/// rasterizer has no font to work with.
#[derive(Debug, Clone)]
pub struct MagickLabelRasterizer {
    tool: PathBuf,
}

impl MagickLabelRasterizer {
    pub fn new(tool: PathBuf) -> Self {
        Self { tool }
    }

    /// Arguments for one label render, writing PNG to stdout.
    pub fn label_args(spec: &TextWatermarkSpec) -> Vec<String> {
        let mut args = Vec::new();
        if let FontSelector::File(path) = &spec.font {
            args.push("-font".to_string());
            args.push(path.to_string_lossy().into_owned());
        }
        if spec.stroke_width > 0 {
            args.push("-stroke".to_string());
            args.push(spec.stroke().to_css());
            args.push("-strokewidth".to_string());
            args.push(spec.stroke_width.to_string());
        }
        args.push("-background".to_string());
        args.push(
            spec.background()
                .map(|c| c.to_css())
                .unwrap_or_else(|| "none".to_string()),
        );
        args.push("-fill".to_string());
        args.push(spec.fill().to_css());
        args.push("-pointsize".to_string());
        args.push(spec.effective_font_size().to_string());
        args.push(format!("label:{}", spec.text));
        args.push("png:-".to_string());
        args
    }
}

impl TextRasterizer for MagickLabelRasterizer {
    fn name(&self) -> &'static str {
        "magick-label"
    }

    fn render(&self, spec: &TextWatermarkSpec) -> Result<Vec<u8>, AppError> {
        if spec.text.is_empty() {
            return Err(AppError::invalid_argument("watermark text is empty"));
        }

        let output = Command::new(&self.tool)
            .args(Self::label_args(spec))
            .output()
            .map_err(|e| {
                AppError::config(format!("cannot run {}", self.tool.display())).with_source(e)
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(AppError::config(if stderr.is_empty() {
                "text watermark rendering failed".to_string()
            } else {
                stderr
            }));
        }
        Ok(output.stdout)
    }
}
