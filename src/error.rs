// Error types module

use std::fmt;
use std::io::Write;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error categories with stable codes.
///
/// The kind is the only thing callers branch on; the detail and source are for
/// humans and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source file missing, unreadable, or undecodable
    InvalidInput,
    /// Format unknown or not writable in the current environment
    UnsupportedFormat,
    /// Filesystem, config, font or subprocess failure
    ConfigError,
    /// Target exists under the skip policy, or rename probing ran out
    OutputExists,
    /// Malformed option value
    InvalidArgument,
    /// One or more batch items failed
    BatchFailed,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput => "E001",
            Self::UnsupportedFormat => "E002",
            Self::ConfigError => "E005",
            Self::OutputExists => "E006",
            Self::InvalidArgument => "E007",
            Self::BatchFailed => "E008",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid input file",
            Self::UnsupportedFormat => "unsupported format",
            Self::ConfigError => "configuration error",
            Self::OutputExists => "output file already exists",
            Self::InvalidArgument => "invalid argument",
            Self::BatchFailed => "batch processing partially failed",
        }
    }

    /// Process exit status for this kind.
    ///
    /// Exit mapping:
    /// - InvalidInput → 3
    /// - everything else in the taxonomy → 2
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput => 3,
            Self::UnsupportedFormat
            | Self::ConfigError
            | Self::OutputExists
            | Self::InvalidArgument
            | Self::BatchFailed => 2,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Centralized error type for every operation in the crate.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct AppError {
    pub kind: ErrorKind,
    pub detail: String,
    #[source]
    pub source: Option<BoxError>,
}

impl AppError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    // Helper constructors for the common kinds

    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, detail)
    }

    pub fn unsupported_format(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedFormat, detail)
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigError, detail)
    }

    pub fn output_exists(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::OutputExists, detail)
    }

    pub fn invalid_argument(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, detail)
    }

    pub fn batch_failed(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::BatchFailed, detail)
    }
}

/// Render an error for the terminal.
///
/// ```text
/// Error [E007]: invalid argument
///   -> unknown gravity: top
/// ```
pub fn write_error(w: &mut dyn Write, err: &AppError) -> std::io::Result<()> {
    writeln!(w, "Error [{}]: {}", err.kind.code(), err.kind.message())?;
    if !err.detail.is_empty() {
        writeln!(w, "  -> {}", err.detail)?;
    }
    if let Some(source) = &err.source {
        writeln!(w, "  caused by: {}", source)?;
    }
    Ok(())
}

pub type Result<T> = std::result::Result<T, AppError>;
