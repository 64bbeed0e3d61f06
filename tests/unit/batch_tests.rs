// Batch collection and runner tests

use image::{Rgba, RgbaImage};
use image_cli::batch::{self, BatchReport};
use image_cli::engine::NativeEngine;
use image_cli::error::ErrorKind;
use image_cli::logging::RunContext;
use image_cli::pipeline::{convert, ConvertOptions};
use std::path::Path;
use tempfile::TempDir;

fn write_png(path: &Path) {
    RgbaImage::from_pixel(6, 4, Rgba([200, 10, 10, 255]))
        .save(path)
        .unwrap();
}

#[test]
fn test_glob_batch_converts_matches_only() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir(&src).unwrap();
    write_png(&src.join("one.png"));
    write_png(&src.join("two.png"));
    std::fs::write(src.join("notes.txt"), b"skip me").unwrap();
    let out = dir.path().join("out");

    let collected = batch::collect(src.join("*.png").to_str().unwrap(), true).unwrap();
    assert_eq!(collected.files.len(), 2);

    let engine = NativeEngine::new();
    let options = ConvertOptions {
        format: Some("jpg".into()),
        ..ConvertOptions::default()
    };
    let mut log = Vec::new();
    let report = batch::run(
        &collected,
        &out,
        RunContext::new(false, true),
        &mut log,
        |input, dir| convert(&engine, input, dir, &options),
    )
    .unwrap();

    assert_eq!(report, BatchReport { success: 2, failed: 0 });
    assert!(out.join("one.jpg").exists());
    assert!(out.join("two.jpg").exists());
    assert!(log.is_empty());
}

#[test]
fn test_second_run_fails_per_item_under_skip() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir(&src).unwrap();
    write_png(&src.join("a.png"));
    let out = dir.path().join("out");

    let collected = batch::collect(src.to_str().unwrap(), false).unwrap();
    let engine = NativeEngine::new();
    let options = ConvertOptions::default();
    let run_once = || {
        let mut log = Vec::new();
        batch::run(
            &collected,
            &out,
            RunContext::default(),
            &mut log,
            |input, dir| convert(&engine, input, dir, &options),
        )
        .unwrap()
    };

    assert_eq!(run_once().into_result().unwrap().success, 1);
    let err = run_once().into_result().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BatchFailed);
    assert_eq!(err.detail, "1 file(s) failed");
}
