//! Raster engine
//!
//! Decodes, transforms and re-encodes pixel buffers given explicit options.
//! Everything above this module works on encoded bytes and calls through the
//! [`RasterEngine`] trait, so the pipeline never touches pixels itself.
//!
//! # Capabilities of [`NativeEngine`]
//!
//! | format | load | save |
//! |--------|------|------|
//! | jpg    | yes  | yes  |
//! | png    | yes  | yes  |
//! | webp   | yes  | yes (lossy) |
//! | gif    | yes  | yes  |
//! | tiff   | yes  | yes  |
//! | avif   | no   | yes  |
//! | pdf, heif, svg | no | no |

pub mod compositor;
pub mod encoder;
pub mod processor;

use crate::error::AppError;

pub use compositor::{Compositor, OverlayLayer, PlacementPosition};
pub use encoder::{EncodedImage, EncoderFactory, EncoderQuality, ImageEncoder};

/// Formats the engine knows by identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EngineFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Tiff,
    Pdf,
    Heif,
    Avif,
    Svg,
}

impl EngineFormat {
    pub const ALL: [EngineFormat; 9] = [
        EngineFormat::Jpeg,
        EngineFormat::Png,
        EngineFormat::WebP,
        EngineFormat::Gif,
        EngineFormat::Tiff,
        EngineFormat::Pdf,
        EngineFormat::Heif,
        EngineFormat::Avif,
        EngineFormat::Svg,
    ];

    /// Engine-side type name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Tiff => "tiff",
            Self::Pdf => "pdf",
            Self::Heif => "heif",
            Self::Avif => "avif",
            Self::Svg => "svg",
        }
    }
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn short_side(&self) -> u32 {
        self.width.min(self.height)
    }
}

/// How a resize request maps onto the target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    /// Scale to fit within the box, output may be smaller on one axis
    #[default]
    Default,
    /// Scale to cover the box, then centre-crop to it
    Crop,
    /// Scale to fit, then centre on a transparent canvas of the exact box
    Embed,
    /// Stretch to the exact box
    Force,
}

/// Target box for a resize. A zero side is derived from the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeRequest {
    pub width: u32,
    pub height: u32,
    pub mode: ResizeMode,
    pub enlarge: bool,
}

/// Right-angle rotation, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Deg90,
    Deg180,
    Deg270,
}

/// Encoded image to paint on top of the base.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub data: Vec<u8>,
    pub left: i32,
    pub top: i32,
    pub opacity: f32,
}

/// Everything one engine pass does, applied in field order:
/// resize, rotate, flip/flop, overlay, encode.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub format: EngineFormat,
    /// Encoder quality, `None` for the encoder default
    pub quality: Option<u8>,
    pub resize: Option<ResizeRequest>,
    pub rotation: Rotation,
    /// Mirror left-right
    pub flip: bool,
    /// Mirror top-bottom
    pub flop: bool,
    pub overlay: Option<Overlay>,
}

impl ProcessOptions {
    /// Plain re-encode to `format`.
    pub fn encode_as(format: EngineFormat) -> Self {
        Self {
            format,
            quality: None,
            resize: None,
            rotation: Rotation::None,
            flip: false,
            flop: false,
            overlay: None,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_resize(mut self, resize: ResizeRequest) -> Self {
        self.resize = Some(resize);
        self
    }
}

/// The raster engine the pipeline delegates pixel work to.
#[cfg_attr(test, mockall::automock)]
pub trait RasterEngine {
    /// Detect the format of encoded bytes.
    fn probe(&self, data: &[u8]) -> Option<EngineFormat>;

    /// Read dimensions (after orientation correction) without a full decode.
    fn dimensions(&self, data: &[u8]) -> Result<Dimensions, AppError>;

    fn supports_load(&self, format: EngineFormat) -> bool;

    fn supports_save(&self, format: EngineFormat) -> bool;

    /// Decode, transform and re-encode.
    fn process(&self, data: &[u8], options: &ProcessOptions) -> Result<Vec<u8>, AppError>;
}

/// Engine built on the `image` crate family.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngine;

impl NativeEngine {
    pub fn new() -> Self {
        Self
    }
}

impl RasterEngine for NativeEngine {
    fn probe(&self, data: &[u8]) -> Option<EngineFormat> {
        processor::detect_format(data)
    }

    fn dimensions(&self, data: &[u8]) -> Result<Dimensions, AppError> {
        processor::read_dimensions(data)
    }

    fn supports_load(&self, format: EngineFormat) -> bool {
        matches!(
            format,
            EngineFormat::Jpeg
                | EngineFormat::Png
                | EngineFormat::WebP
                | EngineFormat::Gif
                | EngineFormat::Tiff
        )
    }

    fn supports_save(&self, format: EngineFormat) -> bool {
        EncoderFactory::create(format).is_some()
    }

    fn process(&self, data: &[u8], options: &ProcessOptions) -> Result<Vec<u8>, AppError> {
        let encoder = EncoderFactory::create(options.format).ok_or_else(|| {
            AppError::unsupported_format(format!(
                "{} output is not supported by this build",
                options.format.name()
            ))
        })?;

        let mut img = processor::decode_image(data)?;

        if let Some(resize) = &options.resize {
            img = processor::resize_image(&img, resize)?;
        }
        img = processor::rotate_image(img, options.rotation);
        if options.flip {
            img = img.fliph();
        }
        if options.flop {
            img = img.flipv();
        }

        let mut rgba = img.to_rgba8();
        if let Some(overlay) = &options.overlay {
            let layer_image = processor::decode_image(&overlay.data)?.to_rgba8();
            let mut compositor = Compositor::new();
            compositor.add_layer(OverlayLayer {
                image: layer_image,
                position: PlacementPosition::new(overlay.left, overlay.top),
                opacity: overlay.opacity,
            });
            compositor.apply(&mut rgba);
        }

        let quality = options
            .quality
            .map(EncoderQuality::with_quality)
            .unwrap_or_default();
        let (width, height) = rgba.dimensions();
        let encoded = encoder.encode(rgba.as_raw(), width, height, quality)?;
        Ok(encoded.data)
    }
}
