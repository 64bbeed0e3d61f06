//! Input collection for batch runs: a file, a directory or a glob.

use regex::Regex;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::AppError;

/// Files to process and the directory their outputs are mirrored from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected {
    pub files: Vec<PathBuf>,
    pub base: PathBuf,
}

pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Convert one glob path component to an anchored regex.
///
/// `*` and `?` never cross a separator because matching is done per
/// component. `[...]` classes are passed through, with a leading `!`
/// turned into `^`.
pub fn glob_to_regex(component: &str) -> Result<Regex, AppError> {
    let mut pattern = String::from("^");
    let mut chars = component.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            '[' => {
                pattern.push('[');
                if chars.peek() == Some(&'!') {
                    chars.next();
                    pattern.push('^');
                }
                for class_char in chars.by_ref() {
                    if class_char == ']' {
                        break;
                    }
                    if class_char == '\\' || class_char == '[' {
                        pattern.push('\\');
                    }
                    pattern.push(class_char);
                }
                pattern.push(']');
            }
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern.push('$');

    Regex::new(&pattern).map_err(|e| {
        AppError::invalid_input(format!("invalid pattern: {}", component)).with_source(e)
    })
}

fn read_dir_names(dir: &Path) -> Vec<String> {
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Expand a glob one path component at a time. Unreadable directories
/// simply contribute no matches.
fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>, AppError> {
    let mut current = vec![PathBuf::new()];

    for component in Path::new(pattern).components() {
        current = match component {
            Component::Normal(part) => {
                let part = part.to_string_lossy();
                if is_glob(&part) {
                    let re = glob_to_regex(&part)?;
                    let mut next = Vec::new();
                    for dir in &current {
                        let mut names: Vec<String> = read_dir_names(dir)
                            .into_iter()
                            .filter(|name| re.is_match(name))
                            .collect();
                        names.sort();
                        next.extend(names.into_iter().map(|name| dir.join(name)));
                    }
                    next
                } else {
                    current.iter().map(|dir| dir.join(&*part)).collect()
                }
            }
            other => current
                .iter()
                .map(|dir| dir.join(other.as_os_str()))
                .collect(),
        };
        if current.is_empty() {
            break;
        }
    }

    Ok(current.into_iter().filter(|p| p.is_file()).collect())
}

fn parent_or_dot(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn collect_dir(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let walker = if recursive {
        WalkDir::new(dir)
    } else {
        WalkDir::new(dir).max_depth(1)
    };
    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Collect batch inputs from a file path, a directory or a glob.
pub fn collect(pattern: &str, recursive: bool) -> Result<Collected, AppError> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(AppError::invalid_input("empty input pattern"));
    }

    let collected = if is_glob(pattern) {
        let files = expand_glob(pattern)?;
        if files.is_empty() {
            return Err(AppError::invalid_input(format!(
                "no files match {}",
                pattern
            )));
        }
        Collected {
            files,
            base: parent_or_dot(Path::new(pattern)),
        }
    } else {
        let path = Path::new(pattern);
        let meta = std::fs::metadata(path).map_err(|e| {
            AppError::invalid_input(format!("cannot access {}", pattern)).with_source(e)
        })?;
        if meta.is_dir() {
            Collected {
                files: collect_dir(path, recursive),
                base: path.to_path_buf(),
            }
        } else {
            Collected {
                files: vec![path.to_path_buf()],
                base: parent_or_dot(path),
            }
        }
    };

    if collected.files.is_empty() {
        return Err(AppError::invalid_input(format!("no files found in {}", pattern)));
    }
    debug!(
        pattern,
        count = collected.files.len(),
        base = %collected.base.display(),
        "collected batch inputs"
    );
    Ok(collected)
}
