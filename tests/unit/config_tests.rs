// Configuration loading tests

use image_cli::config::{Config, ConfigLocation, LogFormat, Overrides};
use image_cli::error::ErrorKind;
use image_cli::pipeline::ConflictPolicy;

fn location(path: std::path::PathBuf) -> ConfigLocation {
    ConfigLocation {
        path,
        explicit: true,
    }
}

#[test]
fn test_yaml_file_with_env_substitution() {
    std::env::set_var("IMAGE_CLI_TEST_OUTPUT_ROOT", "/srv/images");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        r#"
base:
  output_dir: ${IMAGE_CLI_TEST_OUTPUT_ROOT}/out
  conflict: rename
compress:
  default_quality: 70
logging:
  format: text
"#,
    )
    .unwrap();

    let config = Config::load(&location(path), &Overrides::default()).unwrap();

    assert_eq!(config.base.output_dir, "/srv/images/out");
    assert_eq!(config.base.conflict, ConflictPolicy::Rename);
    assert_eq!(config.compress.default_quality, 70);
    assert_eq!(config.compress.max_width, 4096);
    assert_eq!(config.logging.format, LogFormat::Text);
}

#[test]
fn test_unparseable_yaml_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "base: [unclosed\n").unwrap();

    let err = Config::load(&location(path), &Overrides::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigError);
}

#[test]
fn test_unset_variable_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        "watermark:\n  default_font_file: ${IMAGE_CLI_TEST_NEVER_SET_FONT}\n",
    )
    .unwrap();

    let err = Config::load(&location(path), &Overrides::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigError);
}

#[test]
fn test_written_default_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    image_cli::config::write_default(&path, false).unwrap();

    let config = Config::load(&location(path), &Overrides::default()).unwrap();
    assert_eq!(config, Config::default());
}
