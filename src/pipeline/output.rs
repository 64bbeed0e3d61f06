//! Output resolution
//!
//! Turns an input path, an output argument (file, directory, or directory
//! with a trailing separator), an optional desired format and a conflict
//! policy into a concrete target path and effective format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::str::FromStr;

use crate::error::AppError;

use super::format::normalize;

/// Upper bound on `name_<n>` probes under the rename policy.
pub const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// What to do when the computed output path already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Fail with OutputExists
    #[default]
    Skip,
    Overwrite,
    /// Probe `name_1.ext`, `name_2.ext`, ...
    Rename,
}

impl ConflictPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Overwrite => "overwrite",
            Self::Rename => "rename",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "overwrite" => Ok(Self::Overwrite),
            "rename" => Ok(Self::Rename),
            other => Err(AppError::invalid_argument(format!(
                "unknown conflict policy '{}' (use skip, overwrite or rename)",
                other
            ))),
        }
    }
}

/// Everything needed to pick an output target.
#[derive(Debug, Clone)]
pub struct OutputSpec {
    pub input_path: PathBuf,
    pub output: String,
    /// Requested format token, empty or `None` when unset
    pub desired_format: Option<String>,
    /// Canonical format of the input
    pub input_format: Option<String>,
    pub conflict: ConflictPolicy,
    pub overwrite: bool,
}

impl OutputSpec {
    pub fn new(input_path: impl Into<PathBuf>, output: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            output: output.into(),
            desired_format: None,
            input_format: None,
            conflict: ConflictPolicy::Skip,
            overwrite: false,
        }
    }

    pub fn desired_format(mut self, format: Option<&str>) -> Self {
        self.desired_format = format.map(str::to_string);
        self
    }

    pub fn input_format(mut self, format: &str) -> Self {
        self.input_format = Some(format.to_string());
        self
    }

    pub fn conflict(mut self, conflict: ConflictPolicy, overwrite: bool) -> Self {
        self.conflict = conflict;
        self.overwrite = overwrite;
        self
    }
}

/// A concrete, conflict-checked target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutput {
    pub path: PathBuf,
    /// Canonical format token
    pub format: String,
}

fn non_empty(token: Option<&String>) -> Option<String> {
    token
        .map(|t| normalize(t))
        .filter(|t| !t.is_empty())
}

fn denotes_directory(output: &str) -> bool {
    output.ends_with('/') || output.ends_with(MAIN_SEPARATOR) || Path::new(output).is_dir()
}

/// Resolve the target path and effective format, apply the conflict policy
/// and create the parent directory.
pub fn resolve_output(spec: &OutputSpec) -> Result<ResolvedOutput, AppError> {
    let output = spec.output.trim();
    if output.is_empty() {
        return Err(AppError::invalid_argument("output path is empty"));
    }

    let desired = non_empty(spec.desired_format.as_ref());
    let inferred = || {
        desired
            .clone()
            .or_else(|| non_empty(spec.input_format.as_ref()))
            .ok_or_else(|| {
                AppError::unsupported_format(format!(
                    "cannot infer output format for {}",
                    spec.input_path.display()
                ))
            })
    };

    let (path, format) = if denotes_directory(output) {
        let format = inferred()?;
        let stem = spec
            .input_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        (Path::new(output).join(format!("{}.{}", stem, format)), format)
    } else {
        let path = PathBuf::from(output);
        match path.extension().map(|e| e.to_string_lossy().into_owned()) {
            Some(ext) if !ext.is_empty() => {
                let format = desired.clone().unwrap_or_else(|| normalize(&ext));
                (path, format)
            }
            _ => {
                let format = inferred()?;
                (PathBuf::from(format!("{}.{}", output, format)), format)
            }
        }
    };

    let path = apply_conflict(&path, spec.conflict, spec.overwrite)?;
    ensure_parent_dir(&path)?;

    Ok(ResolvedOutput { path, format })
}

fn exists(path: &Path) -> Result<bool, AppError> {
    match std::fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AppError::config(format!("cannot stat {}", path.display())).with_source(e)),
    }
}

fn numbered(path: &Path, n: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    };
    path.with_file_name(name)
}

/// Apply the conflict policy to a constructed path.
pub fn apply_conflict(
    path: &Path,
    policy: ConflictPolicy,
    overwrite: bool,
) -> Result<PathBuf, AppError> {
    if overwrite || policy == ConflictPolicy::Overwrite {
        return Ok(path.to_path_buf());
    }
    if !exists(path)? {
        return Ok(path.to_path_buf());
    }

    match policy {
        ConflictPolicy::Rename => {
            for n in 1..=MAX_RENAME_ATTEMPTS {
                let candidate = numbered(path, n);
                if !exists(&candidate)? {
                    return Ok(candidate);
                }
            }
            Err(AppError::output_exists(format!(
                "no free name after {} attempts: {}",
                MAX_RENAME_ATTEMPTS,
                path.display()
            )))
        }
        _ => Err(AppError::output_exists(path.display().to_string())),
    }
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => std::fs::create_dir_all(parent).map_err(|e| {
            AppError::config(format!("cannot create directory {}", parent.display()))
                .with_source(e)
        }),
        None => Ok(()),
    }
}
