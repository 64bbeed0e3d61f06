// End-to-end pipeline tests with the native engine

use image::{ImageFormat, Rgba, RgbaImage};
use image_cli::engine::{NativeEngine, RasterEngine};
use image_cli::error::ErrorKind;
use image_cli::pipeline::{
    compress, convert, resize, rotate, watermark, CompressOptions, ConvertOptions,
    ResizeOptions, RotateOptions, WatermarkOptions,
};
use image_cli::watermark::font::default_font_available;
use std::path::Path;
use tempfile::TempDir;

fn write_image(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    img.save(path).unwrap();
}

fn dimensions(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

#[test]
fn test_percentage_width_keeps_aspect() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("wide.png");
    write_image(&input, 2000, 1000);

    let options = ResizeOptions {
        width: "50%".into(),
        ..ResizeOptions::default()
    };
    let out = dir.path().join("half.png");
    let path = resize(&NativeEngine::new(), &input, out.to_str().unwrap(), &options).unwrap();

    assert_eq!(dimensions(&path), (1000, 500));
}

#[test]
fn test_cover_crops_to_exact_box() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.png");
    write_image(&input, 300, 100);

    let options = ResizeOptions {
        width: "50".into(),
        height: "50".into(),
        fit: "cover".into(),
        ..ResizeOptions::default()
    };
    let out = dir.path().join("square.png");
    let path = resize(&NativeEngine::new(), &input, out.to_str().unwrap(), &options).unwrap();

    assert_eq!(dimensions(&path), (50, 50));
}

#[test]
fn test_convert_into_directory_changes_extension() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("pic.png");
    write_image(&input, 32, 16);
    let out_dir = format!("{}/converted/", dir.path().display());

    let options = ConvertOptions {
        format: Some("webp".into()),
        quality: 70,
        ..ConvertOptions::default()
    };
    let path = convert(&NativeEngine::new(), &input, &out_dir, &options).unwrap();

    assert_eq!(path, dir.path().join("converted").join("pic.webp"));
    let data = std::fs::read(&path).unwrap();
    assert_eq!(image::guess_format(&data).unwrap(), ImageFormat::WebP);
}

#[test]
fn test_convert_skip_policy_does_not_write() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("pic.png");
    write_image(&input, 8, 8);
    let out = dir.path().join("pic.jpg");
    std::fs::write(&out, b"keep me").unwrap();

    let err = convert(
        &NativeEngine::new(),
        &input,
        out.to_str().unwrap(),
        &ConvertOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::OutputExists);
    assert_eq!(std::fs::read(&out).unwrap(), b"keep me");
}

#[test]
fn test_unsupported_output_format() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("pic.png");
    write_image(&input, 8, 8);

    let out = dir.path().join("pic.pdf");
    let err = convert(
        &NativeEngine::new(),
        &input,
        out.to_str().unwrap(),
        &ConvertOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn test_rotate_swaps_dimensions() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.png");
    write_image(&input, 40, 10);

    let options = RotateOptions {
        degrees: -90,
        flop: true,
        ..RotateOptions::default()
    };
    let out = dir.path().join("rotated.png");
    let path = rotate(&NativeEngine::new(), &input, out.to_str().unwrap(), &options).unwrap();

    assert_eq!(dimensions(&path), (10, 40));
}

#[test]
fn test_compress_keeps_format_and_caps_size() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("big.png");
    write_image(&input, 400, 200);
    image::open(&input)
        .unwrap()
        .save_with_format(dir.path().join("big.jpg"), ImageFormat::Jpeg)
        .unwrap();
    let input = dir.path().join("big.jpg");

    let options = CompressOptions {
        max_width: 100,
        max_height: 100,
        max_bytes: 1,
        ..CompressOptions::default()
    };
    let out_dir = format!("{}/small/", dir.path().display());
    let path = compress(&NativeEngine::new(), &input, &out_dir, &options).unwrap();

    assert_eq!(path, dir.path().join("small").join("big.jpg"));
    assert_eq!(dimensions(&path), (100, 50));
    let engine = NativeEngine::new();
    let data = std::fs::read(&path).unwrap();
    assert_eq!(engine.probe(&data), Some(image_cli::engine::EngineFormat::Jpeg));
}

#[test]
fn test_text_watermark_keeps_base_size() {
    if !default_font_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("base.png");
    write_image(&input, 320, 200);

    let options = WatermarkOptions {
        text: Some("sample".into()),
        stroke_width: 1,
        stroke_color: "black".into(),
        gravity: "center".into(),
        ..WatermarkOptions::default()
    };
    let out = dir.path().join("marked.png");
    let path = watermark(&NativeEngine::new(), &input, out.to_str().unwrap(), &options).unwrap();

    assert_eq!(dimensions(&path), (320, 200));
    let before = image::open(&input).unwrap().to_rgba8();
    let after = image::open(&path).unwrap().to_rgba8();
    assert_ne!(before, after);
}

#[test]
fn test_oversized_logo_is_fitted() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("base.png");
    let logo = dir.path().join("logo.png");
    write_image(&input, 100, 40);
    RgbaImage::from_pixel(10, 10, Rgba([0, 255, 0, 255]))
        .save(&logo)
        .unwrap();

    // Scale 1.0 makes the logo 40x40, which auto-fit shrinks to 36x36.
    let options = WatermarkOptions {
        logo: Some(logo),
        scale: 1.0,
        opacity: 1.0,
        gravity: "northwest".into(),
        ..WatermarkOptions::default()
    };
    let out = dir.path().join("marked.png");
    let path = watermark(&NativeEngine::new(), &input, out.to_str().unwrap(), &options).unwrap();

    let img = image::open(&path).unwrap().to_rgba8();
    assert_eq!(img.get_pixel(20, 20), &Rgba([0, 255, 0, 255]));
    assert_ne!(img.get_pixel(37, 20), &Rgba([0, 255, 0, 255]));
}
