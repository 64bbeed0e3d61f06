// Watermark geometry, stroke and color tests

use image_cli::engine::Dimensions;
use image_cli::watermark::{
    apply_opacity, fit_overlay, parse_color, place, stroke_offsets, Color, Gravity, StrokeMode,
    AUTO_FIT_RATIO,
};

#[test]
fn test_southeast_placement_and_clamp() {
    let base = Dimensions::new(1000, 800);
    let overlay = Dimensions::new(100, 50);

    let pos = place(base, overlay, Gravity::SouthEast, 0, 0);
    assert_eq!((pos.x, pos.y), (900, 750));

    let pos = place(base, overlay, Gravity::SouthEast, 50, 9999);
    assert_eq!((pos.x, pos.y), (900, 750));
}

#[test]
fn test_placement_never_leaves_the_base() {
    let base = Dimensions::new(300, 200);
    let overlay = Dimensions::new(60, 40);
    for gravity in [
        Gravity::NorthWest,
        Gravity::North,
        Gravity::NorthEast,
        Gravity::West,
        Gravity::Center,
        Gravity::East,
        Gravity::SouthWest,
        Gravity::South,
        Gravity::SouthEast,
    ] {
        for (dx, dy) in [(-500, -500), (0, 0), (500, 500), (-7, 13)] {
            let pos = place(base, overlay, gravity, dx, dy);
            assert!((0..=240).contains(&pos.x), "{:?} {:?}", gravity, pos);
            assert!((0..=160).contains(&pos.y), "{:?} {:?}", gravity, pos);
        }
    }
}

#[test]
fn test_auto_fit_keeps_aspect_within_ninety_percent() {
    let base = Dimensions::new(400, 300);
    let fitted = fit_overlay(base, Dimensions::new(800, 200), AUTO_FIT_RATIO).unwrap();
    assert!(fitted.width <= 360 && fitted.height <= 270);
    assert_eq!(fitted, Dimensions::new(360, 90));
}

#[test]
fn test_disc_stroke_offsets() {
    let offsets = stroke_offsets(2, StrokeMode::Disc);
    assert!(!offsets.contains(&(0, 0)));
    assert!(offsets.iter().all(|(dx, dy)| dx * dx + dy * dy <= 4));
    assert_eq!(offsets.len(), 12);
}

#[test]
fn test_eight_direction_stroke_offsets() {
    let offsets = stroke_offsets(2, StrokeMode::EightDirection);
    assert_eq!(offsets.len(), 16);
    assert!(offsets.contains(&(2, -2)));
    assert!(stroke_offsets(0, StrokeMode::EightDirection).is_empty());
}

#[test]
fn test_apply_opacity() {
    assert_eq!(apply_opacity(255, 0.5), 128);
    for alpha in [0u8, 1, 77, 200, 255] {
        assert_eq!(apply_opacity(alpha, 0.0), 0);
        assert_eq!(apply_opacity(alpha, 1.0), alpha);
    }
}

#[test]
fn test_color_precedence() {
    assert_eq!(parse_color("#ff000080"), Some(Color::new(255, 0, 0, 128)));
    assert_eq!(parse_color("rgb(1, 2, 3)"), Some(Color::new(1, 2, 3, 255)));
    assert_eq!(parse_color("Green"), Some(Color::new(0, 128, 0, 255)));
    assert_eq!(parse_color("none"), None);
}
