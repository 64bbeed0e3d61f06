// Configuration module

use ::config::{Environment, File, FileFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::pipeline::output::ConflictPolicy;

const ENV_PREFIX: &str = "IMAGE_CLI";
const CONFIG_PATH_ENV: &str = "IMAGE_CLI_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub base: BaseConfig,
    pub compress: CompressConfig,
    pub watermark: WatermarkConfig,
    pub logging: LoggingConfig,
}

fn default_output_dir() -> String {
    "./output".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaseConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default = "default_true")]
    pub recursive: bool,
    #[serde(default)]
    pub conflict: ConflictPolicy,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            overwrite: false,
            recursive: true,
            conflict: ConflictPolicy::Skip,
        }
    }
}

fn default_quality() -> i32 {
    85
}

fn default_max_dimension() -> u32 {
    4096
}

/// Compression defaults. A zero max dimension disables that cap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompressConfig {
    #[serde(default = "default_quality")]
    pub default_quality: i32,
    #[serde(default = "default_max_dimension")]
    pub max_width: u32,
    #[serde(default = "default_max_dimension")]
    pub max_height: u32,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            default_quality: default_quality(),
            max_width: default_max_dimension(),
            max_height: default_max_dimension(),
        }
    }
}

fn default_opacity() -> f64 {
    0.5
}

fn default_scale() -> f64 {
    0.2
}

fn default_gravity() -> String {
    "southeast".to_string()
}

fn default_font_size() -> u32 {
    24
}

fn default_color() -> String {
    "white".to_string()
}

fn default_background() -> String {
    "none".to_string()
}

fn default_stroke_mode() -> String {
    "circle".to_string()
}

/// Defaults applied to watermark flags the user did not set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatermarkConfig {
    #[serde(default = "default_opacity")]
    pub default_opacity: f64,
    #[serde(default = "default_scale")]
    pub default_scale: f64,
    #[serde(default = "default_gravity")]
    pub default_gravity: String,
    #[serde(default)]
    pub default_offset_x: i32,
    #[serde(default)]
    pub default_offset_y: i32,
    #[serde(default = "default_font_size")]
    pub default_font_size: u32,
    #[serde(default)]
    pub default_font: String,
    #[serde(default)]
    pub default_font_file: String,
    #[serde(default = "default_color")]
    pub default_color: String,
    #[serde(default)]
    pub default_stroke_color: String,
    #[serde(default)]
    pub default_stroke_width: u32,
    #[serde(default = "default_background")]
    pub default_background: String,
    #[serde(default = "default_stroke_mode")]
    pub default_stroke_mode: String,
    /// Allow the external label renderer when no font asset can be loaded
    #[serde(default = "default_true")]
    pub text_fallback: bool,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            default_opacity: default_opacity(),
            default_scale: default_scale(),
            default_gravity: default_gravity(),
            default_offset_x: 0,
            default_offset_y: 0,
            default_font_size: default_font_size(),
            default_font: String::new(),
            default_font_file: String::new(),
            default_color: default_color(),
            default_stroke_color: String::new(),
            default_stroke_width: 0,
            default_background: default_background(),
            default_stroke_mode: default_stroke_mode(),
            text_fallback: true,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Json,
        }
    }
}

/// Where the configuration file lives and whether it must exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub path: PathBuf,
    /// Explicit paths (flag or env) are required to exist
    pub explicit: bool,
}

impl ConfigLocation {
    /// Resolve the config path: flag, then `IMAGE_CLI_CONFIG`, then
    /// `~/.config/image-cli/config.yaml`, then `./config.yaml`.
    pub fn resolve(flag: Option<&Path>) -> Self {
        if let Some(path) = flag.filter(|p| !p.as_os_str().is_empty()) {
            return Self {
                path: path.to_path_buf(),
                explicit: true,
            };
        }
        if let Some(env) = std::env::var_os(CONFIG_PATH_ENV).filter(|v| !v.is_empty()) {
            return Self {
                path: PathBuf::from(env),
                explicit: true,
            };
        }
        match std::env::var_os("HOME").filter(|v| !v.is_empty()) {
            Some(home) => Self {
                path: PathBuf::from(home)
                    .join(".config")
                    .join("image-cli")
                    .join("config.yaml"),
                explicit: false,
            },
            None => Self {
                path: PathBuf::from("./config.yaml"),
                explicit: false,
            },
        }
    }
}

/// Command-line overrides applied on top of file and environment layers.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub conflict: Option<ConflictPolicy>,
    pub recursive: Option<bool>,
}

/// Replace `${VAR_NAME}` with environment variable values.
///
/// Every referenced variable must be set.
pub fn substitute_env(yaml: &str) -> Result<String, AppError> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| AppError::config("invalid substitution pattern").with_source(e))?;

    let mut missing = None;
    let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
        let var_name = &caps[1];
        match std::env::var(var_name) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            }
        }
    });

    if let Some(var_name) = missing {
        return Err(AppError::config(format!(
            "Environment variable '{}' is referenced but not set",
            var_name
        )));
    }
    Ok(substituted.into_owned())
}

impl Config {
    /// Load configuration from defaults, the YAML file, the environment and
    /// command-line overrides, in increasing precedence.
    pub fn load(location: &ConfigLocation, overrides: &Overrides) -> Result<Self, AppError> {
        let yaml = match std::fs::read_to_string(&location.path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !location.explicit => None,
            Err(e) => {
                return Err(AppError::config(format!(
                    "cannot read config file {}",
                    location.path.display()
                ))
                .with_source(e))
            }
        };
        let yaml = yaml.map(|text| substitute_env(&text)).transpose()?;
        Self::from_sources(yaml.as_deref(), overrides)
    }

    /// Build from an optional YAML document plus environment and overrides.
    pub fn from_sources(yaml: Option<&str>, overrides: &Overrides) -> Result<Self, AppError> {
        let defaults = Config::default();
        let mut builder = ::config::Config::builder();

        builder = builder.add_source(File::from_str(&defaults.to_yaml()?, FileFormat::Yaml));
        if let Some(yaml) = yaml {
            builder = builder.add_source(File::from_str(yaml, FileFormat::Yaml));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder = builder
            .set_override_option("base.output_dir", std::env::var("IMAGE_CLI_OUTPUT").ok())
            .and_then(|b| {
                b.set_override_option(
                    "base.recursive",
                    std::env::var("IMAGE_CLI_RECURSIVE")
                        .ok()
                        .and_then(|v| v.parse::<bool>().ok()),
                )
            })
            .and_then(|b| {
                b.set_override_option(
                    "base.conflict",
                    overrides.conflict.map(|c| c.as_str().to_string()),
                )
            })
            .and_then(|b| b.set_override_option("base.recursive", overrides.recursive))
            .map_err(|e| AppError::config("invalid configuration override").with_source(e))?;

        let config: Config = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AppError::config("cannot parse configuration").with_source(e))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.compress.default_quality > 100 {
            return Err(AppError::config(format!(
                "compress.default_quality {} must be at most 100",
                self.compress.default_quality
            )));
        }
        if self.logging.level.trim().is_empty() {
            return Err(AppError::config("logging.level cannot be empty"));
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, AppError> {
        serde_yaml::to_string(self)
            .map_err(|e| AppError::config("cannot serialize configuration").with_source(e))
    }
}

const CONFIG_HEADER: &str = "# image-cli configuration\n\
# Environment overrides: IMAGE_CLI_<SECTION>__<KEY>, e.g. IMAGE_CLI_BASE__CONFLICT=rename\n\n";

/// Write the default configuration to `path`.
///
/// Refuses to replace an existing file unless `overwrite` is set.
pub fn write_default(path: &Path, overwrite: bool) -> Result<(), AppError> {
    if path.exists() && !overwrite {
        return Err(AppError::output_exists(format!(
            "config file already exists: {}",
            path.display()
        )));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::config("cannot create config directory").with_source(e))?;
    }
    let body = format!("{}{}", CONFIG_HEADER, Config::default().to_yaml()?);
    std::fs::write(path, body)
        .map_err(|e| AppError::config("cannot write config file").with_source(e))
}
