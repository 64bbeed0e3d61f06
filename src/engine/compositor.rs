//! Overlay compositor.
//!
//! Blends RGBA layers onto a base image with the Porter-Duff "over"
//! operator. Layer pixels that fall outside the base are clipped.

use image::{Rgba, RgbaImage};

/// Top-left corner of a layer in base-image coordinates. May be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An overlay layer to be composited onto an image.
#[derive(Clone)]
pub struct OverlayLayer {
    pub image: RgbaImage,
    pub position: PlacementPosition,
    /// Opacity to apply (0.0 to 1.0). Applied on top of the layer's alpha channel.
    pub opacity: f32,
}

impl std::fmt::Debug for OverlayLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayLayer")
            .field("dimensions", &(self.image.width(), self.image.height()))
            .field("position", &self.position)
            .field("opacity", &self.opacity)
            .finish()
    }
}

/// Applies layers in the order they were added.
#[derive(Debug, Default)]
pub struct Compositor {
    layers: Vec<OverlayLayer>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(&mut self, layer: OverlayLayer) {
        self.layers.push(layer);
    }

    pub fn apply(&self, target: &mut RgbaImage) {
        for layer in &self.layers {
            blend_layer(target, layer);
        }
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

fn blend_layer(target: &mut RgbaImage, layer: &OverlayLayer) {
    let target_width = target.width() as i64;
    let target_height = target.height() as i64;
    let pos_x = layer.position.x as i64;
    let pos_y = layer.position.y as i64;

    // Visible region, clamped to target bounds
    let x_start = pos_x.max(0);
    let y_start = pos_y.max(0);
    let x_end = (pos_x + layer.image.width() as i64).min(target_width);
    let y_end = (pos_y + layer.image.height() as i64).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let fg = *layer.image.get_pixel((tx - pos_x) as u32, (ty - pos_y) as u32);
            let bg = *target.get_pixel(tx as u32, ty as u32);
            target.put_pixel(tx as u32, ty as u32, blend_pixels(bg, fg, layer.opacity));
        }
    }
}

/// Blend two pixels using alpha compositing with additional opacity.
///
/// Uses the "over" operator: result = foreground + background * (1 - foreground.alpha)
pub fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let fg_alpha = (foreground[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
