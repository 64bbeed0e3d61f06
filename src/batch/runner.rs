//! Sequential batch runner.

use std::io::Write;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use tracing::{info, warn};

use crate::error::AppError;
use crate::logging::RunContext;

use super::collect::Collected;

/// Outcome counts of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub success: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.success + self.failed
    }

    /// Fold the report into an error when any item failed.
    pub fn into_result(self) -> Result<Self, AppError> {
        if self.failed > 0 {
            Err(AppError::batch_failed(format!(
                "{} file(s) failed",
                self.failed
            )))
        } else {
            Ok(self)
        }
    }
}

/// Output directory for `item`: `out` joined with the item's parent
/// relative to `base`, or `out` itself when the item is outside `base`.
pub fn output_dir_for(item: &Path, base: &Path, out: &Path) -> PathBuf {
    let parent = item.parent().unwrap_or_else(|| Path::new(""));
    match parent.strip_prefix(base) {
        Ok(relative) if !relative.as_os_str().is_empty() => out.join(relative),
        _ => out.to_path_buf(),
    }
}

/// Directory argument with a trailing separator, so output resolution
/// treats it as a directory even before it exists.
fn as_dir_argument(dir: &Path) -> String {
    let mut arg = dir.to_string_lossy().into_owned();
    if !arg.ends_with(MAIN_SEPARATOR) && !arg.ends_with('/') {
        arg.push(MAIN_SEPARATOR);
    }
    arg
}

fn progress_error(e: std::io::Error) -> AppError {
    AppError::config("cannot write progress").with_source(e)
}

/// Run `op` over every collected file, one at a time.
///
/// `op` gets the input path and the output directory argument. Failures
/// are counted and reported, and the run moves on to the next file.
pub fn run<F>(
    collected: &Collected,
    out: &Path,
    ctx: RunContext,
    w: &mut dyn Write,
    mut op: F,
) -> Result<BatchReport, AppError>
where
    F: FnMut(&Path, &str) -> Result<PathBuf, AppError>,
{
    let mut report = BatchReport::default();
    if ctx.shows_summary() {
        writeln!(w, "processing {} file(s)", collected.files.len()).map_err(progress_error)?;
    }

    for item in &collected.files {
        if ctx.shows_progress() {
            writeln!(w, "processing: {}", item.display()).map_err(progress_error)?;
        }

        let dir = output_dir_for(item, &collected.base, out);
        match op(item, &as_dir_argument(&dir)) {
            Ok(path) => {
                report.success += 1;
                if ctx.shows_progress() {
                    writeln!(w, "  -> {}", path.display()).map_err(progress_error)?;
                }
            }
            Err(e) => {
                report.failed += 1;
                warn!(
                    input = %item.display(),
                    code = e.kind().code(),
                    error = %e.detail,
                    "batch item failed"
                );
                if ctx.shows_summary() {
                    writeln!(w, "failed: {}: {}", item.display(), e.detail)
                        .map_err(progress_error)?;
                }
            }
        }
    }

    info!(
        success = report.success,
        failed = report.failed,
        "batch finished"
    );
    if ctx.shows_summary() {
        writeln!(
            w,
            "done: {} succeeded, {} failed",
            report.success, report.failed
        )
        .map_err(progress_error)?;
    }
    Ok(report)
}
