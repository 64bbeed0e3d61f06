// Output resolution tests

use image_cli::error::ErrorKind;
use image_cli::pipeline::output::{apply_conflict, resolve_output, ConflictPolicy, OutputSpec};
use std::path::{Path, MAIN_SEPARATOR};
use tempfile::TempDir;

fn touch(path: &Path) {
    std::fs::write(path, b"existing").unwrap();
}

fn spec(dir: &TempDir, output: &str) -> OutputSpec {
    OutputSpec::new(dir.path().join("photo.jpg"), output).input_format("jpg")
}

#[test]
fn test_skip_policy_reports_existing_target_and_leaves_it_alone() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("out.png");
    touch(&target);

    let err = resolve_output(&spec(&dir, target.to_str().unwrap())).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::OutputExists);
    assert_eq!(std::fs::read(&target).unwrap(), b"existing");
}

#[test]
fn test_rename_returns_next_free_variant() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("out.png");
    touch(&target);
    for n in 1..=3 {
        touch(&dir.path().join(format!("out_{}.png", n)));
    }

    let resolved = resolve_output(
        &spec(&dir, target.to_str().unwrap()).conflict(ConflictPolicy::Rename, false),
    )
    .unwrap();

    assert_eq!(resolved.path, dir.path().join("out_4.png"));
    assert_eq!(resolved.format, "png");
}

#[test]
fn test_overwrite_flag_beats_skip_policy() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("out.png");
    touch(&target);

    let path = apply_conflict(&target, ConflictPolicy::Skip, true).unwrap();
    assert_eq!(path, target);
}

#[test]
fn test_directory_with_trailing_separator_is_created() {
    let dir = TempDir::new().unwrap();
    let out_dir = dir.path().join("fresh").join("nested");
    let arg = format!("{}{}", out_dir.display(), MAIN_SEPARATOR);

    let resolved = resolve_output(&spec(&dir, &arg).desired_format(Some("WEBP"))).unwrap();

    assert_eq!(resolved.path, out_dir.join("photo.webp"));
    assert_eq!(resolved.format, "webp");
    assert!(out_dir.is_dir());
}

#[test]
fn test_existing_directory_without_separator() {
    let dir = TempDir::new().unwrap();
    let resolved = resolve_output(&spec(&dir, dir.path().to_str().unwrap())).unwrap();
    assert_eq!(resolved.path, dir.path().join("photo.jpg"));
}

#[test]
fn test_extension_inferred_from_input_format() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("result");

    let resolved = resolve_output(&spec(&dir, base.to_str().unwrap())).unwrap();

    assert_eq!(resolved.path, dir.path().join("result.jpg"));
    assert_eq!(resolved.format, "jpg");
}

#[test]
fn test_desired_format_wins_over_extension() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("result.png");

    let resolved =
        resolve_output(&spec(&dir, target.to_str().unwrap()).desired_format(Some(".jpeg")))
            .unwrap();

    assert_eq!(resolved.path, target);
    assert_eq!(resolved.format, "jpg");
}

#[test]
fn test_no_format_to_infer() {
    let dir = TempDir::new().unwrap();
    let spec = OutputSpec::new(dir.path().join("photo"), dir.path().join("x").to_str().unwrap());
    let err = resolve_output(&spec).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn test_blank_output_is_invalid_argument() {
    let dir = TempDir::new().unwrap();
    let err = resolve_output(&spec(&dir, "   ")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
