// Format registry tests

use image_cli::error::ErrorKind;
use image_cli::pipeline::format::{
    from_engine_type, normalize, parse_ico_sizes, to_engine_type, DEFAULT_ICO_SIZES,
};
use rstest::rstest;

#[rstest]
#[case("JPEG")]
#[case(".jpg")]
#[case("Tif")]
#[case(" png ")]
#[case(".HEIC")]
#[case("webp")]
#[case("bmp")]
fn test_normalize_is_idempotent(#[case] token: &str) {
    let once = normalize(token);
    assert_eq!(normalize(&once), once);
}

#[rstest]
#[case("jpeg", "jpg")]
#[case(".TIF", "tiff")]
#[case("heic", "heif")]
#[case("Avif", "avif")]
fn test_normalize_aliases(#[case] token: &str, #[case] expected: &str) {
    assert_eq!(normalize(token), expected);
}

#[rstest]
#[case("jpeg")]
#[case("png")]
#[case("webp")]
#[case("gif")]
#[case("tif")]
#[case("pdf")]
#[case("heic")]
#[case("avif")]
#[case("svg")]
fn test_engine_round_trip(#[case] token: &str) {
    let canonical = normalize(token);
    let engine = to_engine_type(&canonical).unwrap();
    assert_eq!(from_engine_type(engine), canonical);
}

#[test]
fn test_unknown_engine_format() {
    let err = to_engine_type("bmp").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn test_ico_sizes_dedup_descending() {
    assert_eq!(
        parse_ico_sizes("256,64,256,32").unwrap(),
        Some(vec![256, 64, 32])
    );
    assert_eq!(
        parse_ico_sizes("16, 48,128").unwrap(),
        Some(vec![128, 48, 16])
    );
}

#[test]
fn test_ico_sizes_empty_means_default() {
    assert_eq!(parse_ico_sizes("").unwrap(), None);
    assert!(DEFAULT_ICO_SIZES.windows(2).all(|w| w[0] > w[1]));
}

#[rstest]
#[case("24")]
#[case("32,abc")]
#[case("512")]
fn test_ico_sizes_rejects(#[case] csv: &str) {
    assert_eq!(
        parse_ico_sizes(csv).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
}
