//! `formats` and `info` output.

use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::engine::processor::read_orientation;
use crate::engine::{EngineFormat, RasterEngine};
use crate::error::AppError;
use crate::external;
use crate::pipeline::format::{from_engine_type, normalize, ICO};

/// Supported formats and every conversion between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatTable {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub conversions: Vec<Conversion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversion {
    pub from: String,
    pub to: String,
}

/// Build the table. `ico` is listed as an output only when PNG can be
/// written and `ico_available` is set.
pub fn format_table(
    engine: &dyn RasterEngine,
    ico_available: bool,
    from: Option<&str>,
    to: Option<&str>,
) -> FormatTable {
    let tokens = |pred: &dyn Fn(EngineFormat) -> bool| -> Vec<String> {
        EngineFormat::ALL
            .iter()
            .copied()
            .filter(|f| pred(*f))
            .map(|f| from_engine_type(f).to_string())
            .collect()
    };

    let mut inputs = tokens(&|f| engine.supports_load(f));
    let mut outputs = tokens(&|f| engine.supports_save(f));
    if ico_available && engine.supports_save(EngineFormat::Png) {
        outputs.push(ICO.to_string());
    }

    if let Some(from) = from.map(normalize).filter(|f| !f.is_empty()) {
        inputs.retain(|f| *f == from);
    }
    if let Some(to) = to.map(normalize).filter(|f| !f.is_empty()) {
        outputs.retain(|f| *f == to);
    }
    inputs.sort();
    outputs.sort();

    let conversions = inputs
        .iter()
        .flat_map(|from| {
            outputs.iter().map(move |to| Conversion {
                from: from.clone(),
                to: to.clone(),
            })
        })
        .collect();

    FormatTable {
        inputs,
        outputs,
        conversions,
    }
}

fn json_error(e: serde_json::Error) -> AppError {
    AppError::config("cannot serialize output").with_source(e)
}

fn write_error(e: std::io::Error) -> AppError {
    AppError::config("cannot write output").with_source(e)
}

pub fn print_formats(w: &mut dyn Write, table: &FormatTable, json: bool) -> Result<(), AppError> {
    if json {
        let text = serde_json::to_string_pretty(table).map_err(json_error)?;
        return writeln!(w, "{}", text).map_err(write_error);
    }

    writeln!(w, "Input formats:  {}", table.inputs.join(", ")).map_err(write_error)?;
    writeln!(w, "Output formats: {}", table.outputs.join(", ")).map_err(write_error)?;
    writeln!(w, "Conversions:").map_err(write_error)?;
    for c in &table.conversions {
        writeln!(w, "  {} -> {}", c.from, c.to).map_err(write_error)?;
    }
    Ok(())
}

/// What `info` reports about one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub file: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<u32>,
}

pub fn image_info(engine: &dyn RasterEngine, path: &Path) -> Result<ImageInfo, AppError> {
    let meta = std::fs::metadata(path).map_err(|e| {
        AppError::invalid_input(format!("cannot access {}", path.display())).with_source(e)
    })?;
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let is_ico = path
        .extension()
        .map(|ext| normalize(&ext.to_string_lossy()) == ICO)
        .unwrap_or(false);
    if is_ico {
        let (width, height) = external::read_ico_size(path)?;
        return Ok(ImageInfo {
            file,
            format: ICO.to_string(),
            width,
            height,
            size_bytes: meta.len(),
            orientation: None,
        });
    }

    let data = std::fs::read(path).map_err(|e| {
        AppError::invalid_input(format!("cannot read {}", path.display())).with_source(e)
    })?;
    let format = engine.probe(&data).ok_or_else(|| {
        AppError::unsupported_format(format!("unrecognized image format: {}", path.display()))
    })?;
    let dims = engine.dimensions(&data)?;

    Ok(ImageInfo {
        file,
        format: from_engine_type(format).to_string(),
        width: dims.width,
        height: dims.height,
        size_bytes: meta.len(),
        orientation: read_orientation(&data),
    })
}

pub fn print_info(w: &mut dyn Write, info: &ImageInfo, json: bool) -> Result<(), AppError> {
    if json {
        let text = serde_json::to_string_pretty(info).map_err(json_error)?;
        return writeln!(w, "{}", text).map_err(write_error);
    }

    writeln!(w, "File:        {}", info.file).map_err(write_error)?;
    writeln!(w, "Format:      {}", info.format).map_err(write_error)?;
    writeln!(w, "Dimensions:  {}x{}", info.width, info.height).map_err(write_error)?;
    writeln!(w, "Size:        {} bytes", info.size_bytes).map_err(write_error)?;
    if let Some(orientation) = info.orientation {
        writeln!(w, "Orientation: {}", orientation).map_err(write_error)?;
    }
    Ok(())
}
