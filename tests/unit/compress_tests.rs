// Compression search tests against a fake engine

use image_cli::engine::{Dimensions, EngineFormat, ProcessOptions, RasterEngine};
use image_cli::error::{AppError, ErrorKind};
use image_cli::pipeline::compress::{compress_to_budget, CompressionBudget};
use image_cli::pipeline::parse_size_bytes;
use std::cell::RefCell;

/// Output is `quality * 100` bytes; every call records the input it saw.
struct FakeEngine {
    seen: RefCell<Vec<(Vec<u8>, u8)>>,
}

impl FakeEngine {
    fn new() -> Self {
        Self {
            seen: RefCell::new(Vec::new()),
        }
    }

    fn qualities(&self) -> Vec<u8> {
        self.seen.borrow().iter().map(|(_, q)| *q).collect()
    }
}

impl RasterEngine for FakeEngine {
    fn probe(&self, _data: &[u8]) -> Option<EngineFormat> {
        Some(EngineFormat::Jpeg)
    }

    fn dimensions(&self, _data: &[u8]) -> Result<Dimensions, AppError> {
        Ok(Dimensions::new(10, 10))
    }

    fn supports_load(&self, _format: EngineFormat) -> bool {
        true
    }

    fn supports_save(&self, _format: EngineFormat) -> bool {
        true
    }

    fn process(&self, data: &[u8], options: &ProcessOptions) -> Result<Vec<u8>, AppError> {
        let quality = options.quality.unwrap_or(100);
        self.seen.borrow_mut().push((data.to_vec(), quality));
        Ok(vec![0xAB; quality as usize * 100])
    }
}

fn budget(target: u64, start: i32, aggressive: bool) -> CompressionBudget {
    CompressionBudget {
        target_max_bytes: target,
        starting_quality: start,
        aggressive,
    }
}

#[test]
fn test_unreachable_budget_stops_at_floor_without_error() {
    let engine = FakeEngine::new();
    let source = b"original".to_vec();

    let outcome = compress_to_budget(
        &engine,
        &source,
        &ProcessOptions::encode_as(EngineFormat::Jpeg),
        &budget(1, 85, false),
        85,
    )
    .unwrap();

    assert_eq!(outcome.quality, 10);
    assert!(!outcome.data.is_empty());
    assert_eq!(engine.qualities().last(), Some(&10));
}

#[test]
fn test_every_attempt_starts_from_the_source() {
    let engine = FakeEngine::new();
    let source = b"original".to_vec();

    compress_to_budget(
        &engine,
        &source,
        &ProcessOptions::encode_as(EngineFormat::Jpeg),
        &budget(5000, 60, true),
        85,
    )
    .unwrap();

    let seen = engine.seen.borrow();
    assert!(seen.len() > 1);
    assert!(seen.iter().all(|(input, _)| *input == source));
}

#[test]
fn test_aggressive_steps_by_five() {
    let engine = FakeEngine::new();
    let outcome = compress_to_budget(
        &engine,
        b"x",
        &ProcessOptions::encode_as(EngineFormat::WebP),
        &budget(7000, 80, true),
        85,
    )
    .unwrap();

    assert_eq!(engine.qualities(), vec![80, 75, 70]);
    assert_eq!(outcome.quality, 70);
}

#[test]
fn test_unbounded_budget_encodes_once_with_default_quality() {
    let engine = FakeEngine::new();
    let outcome = compress_to_budget(
        &engine,
        b"x",
        &ProcessOptions::encode_as(EngineFormat::Jpeg),
        &budget(0, 0, false),
        72,
    )
    .unwrap();

    assert_eq!(engine.qualities(), vec![72]);
    assert_eq!(outcome.quality, 72);
}

#[test]
fn test_size_parsing() {
    assert_eq!(parse_size_bytes("").unwrap(), 0);
    assert_eq!(parse_size_bytes("500kb").unwrap(), 500 * 1024);
    assert_eq!(parse_size_bytes("1.5MB").unwrap(), 1_572_864);
    assert_eq!(parse_size_bytes("2048").unwrap(), 2048);
    assert_eq!(parse_size_bytes("10B").unwrap(), 10);
    assert_eq!(
        parse_size_bytes("-1MB").unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
}
