// Logging module for structured logging using the tracing crate

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::AppError;

/// Environment variable holding an `EnvFilter` directive that overrides
/// every other level setting.
pub const LOG_ENV: &str = "IMAGE_CLI_LOG";

/// How chatty the command line should be.
///
/// Passed explicitly to everything that prints progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunContext {
    pub verbose: bool,
    pub quiet: bool,
}

impl RunContext {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Per-item progress lines are shown only when verbose and not quiet.
    pub fn shows_progress(&self) -> bool {
        self.verbose && !self.quiet
    }

    pub fn shows_summary(&self) -> bool {
        !self.quiet
    }
}

/// Pick the filter directive from the config level and run context.
pub fn effective_level(config: &LoggingConfig, ctx: RunContext) -> String {
    if ctx.quiet {
        "error".to_string()
    } else if ctx.verbose {
        "debug".to_string()
    } else {
        config.level.trim().to_lowercase()
    }
}

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - JSON or compact text formatting from `logging.format`
/// - Level filtering from `logging.level`, `--verbose`/`--quiet`, or `IMAGE_CLI_LOG`
/// - Output to stderr so stdout carries only command results
///
/// # Errors
///
/// Returns a config error if the level directive is invalid or a global
/// subscriber was already installed.
pub fn init_subscriber(config: &LoggingConfig, ctx: RunContext) -> Result<(), AppError> {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(effective_level(config, ctx)).map_err(|e| {
            AppError::config(format!("invalid logging.level '{}'", config.level)).with_source(e)
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.compact().try_init(),
    };
    result.map_err(|e| AppError::config(format!("cannot initialize logging: {}", e)))
}
