//! Image encoder abstraction
//!
//! Every writable format has one encoder taking raw RGBA pixels:
//! - JPEG, GIF and TIFF through the `image` crate
//! - PNG through the `image` crate, then recompressed with `oxipng`
//! - lossy WebP through the `webp` crate
//! - AVIF through `ravif`

use std::io::Cursor;

use crate::error::AppError;

use super::EngineFormat;

/// Quality settings for image encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderQuality {
    /// Quality value (1-100, where 100 is best quality)
    pub quality: u8,
    /// Effort/speed trade-off (0-10, where 10 is slowest/best compression)
    pub effort: u8,
}

impl Default for EncoderQuality {
    fn default() -> Self {
        Self {
            quality: 80,
            effort: 4,
        }
    }
}

impl EncoderQuality {
    /// Create quality settings with specified quality level
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            effort: 4,
        }
    }

    /// Set the encoding effort (speed vs compression trade-off)
    pub fn with_effort(mut self, effort: u8) -> Self {
        self.effort = effort.clamp(0, 10);
        self
    }
}

/// Result of encoding an image
#[derive(Debug)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: EngineFormat,
}

impl EncodedImage {
    pub fn new(data: Vec<u8>, format: EngineFormat) -> Self {
        Self { data, format }
    }
}

/// Trait for image encoders
///
/// Implementations take raw RGBA pixels (4 bytes per pixel, row-major).
pub trait ImageEncoder: Send + Sync {
    /// The output format this encoder produces
    fn format(&self) -> EngineFormat;

    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, AppError>;

    /// Check if this encoder keeps the alpha channel
    fn supports_transparency(&self) -> bool;
}

fn encode_failed(format: &str, reason: impl std::fmt::Display) -> AppError {
    AppError::invalid_input("image processing failed")
        .with_source(format!("{} encoding failed: {}", format, reason))
}

/// JPEG encoder using the image crate
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> EngineFormat {
        EngineFormat::Jpeg
    }

    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, AppError> {
        use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
        use image::ImageEncoder as _;

        // JPEG has no alpha
        let rgb_data = rgba_to_rgb(data);

        let mut output = Cursor::new(Vec::new());
        let encoder = ImageJpegEncoder::new_with_quality(&mut output, quality.quality);

        encoder
            .write_image(&rgb_data, width, height, image::ColorType::Rgb8)
            .map_err(|e| encode_failed("jpeg", e))?;

        Ok(EncodedImage::new(output.into_inner(), EngineFormat::Jpeg))
    }

    fn supports_transparency(&self) -> bool {
        false
    }
}

/// PNG encoder: lossless write, then an `oxipng` pass whose preset follows
/// the effort setting. Effort 0 skips the optimization pass.
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> EngineFormat {
        EngineFormat::Png
    }

    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, AppError> {
        use image::codecs::png::PngEncoder as ImagePngEncoder;
        use image::ImageEncoder as _;

        let mut output = Cursor::new(Vec::new());
        ImagePngEncoder::new(&mut output)
            .write_image(data, width, height, image::ColorType::Rgba8)
            .map_err(|e| encode_failed("png", e))?;
        let raw = output.into_inner();

        if quality.effort == 0 {
            return Ok(EncodedImage::new(raw, EngineFormat::Png));
        }

        let options = oxipng::Options::from_preset(quality.effort.min(6));
        let optimized =
            oxipng::optimize_from_memory(&raw, &options).map_err(|e| encode_failed("png", e))?;

        Ok(EncodedImage::new(optimized, EngineFormat::Png))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// Lossy WebP encoder using the `webp` crate
pub struct WebPEncoder;

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> EngineFormat {
        EngineFormat::WebP
    }

    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, AppError> {
        let memory = webp::Encoder::from_rgba(data, width, height)
            .encode_simple(false, quality.quality as f32)
            .map_err(|e| encode_failed("webp", format!("{:?}", e)))?;

        Ok(EncodedImage::new(memory.to_vec(), EngineFormat::WebP))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// GIF encoder using the image crate (single frame)
pub struct GifEncoder;

impl ImageEncoder for GifEncoder {
    fn format(&self) -> EngineFormat {
        EngineFormat::Gif
    }

    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, AppError> {
        use image::codecs::gif::GifEncoder as ImageGifEncoder;

        let mut output = Vec::new();
        {
            // The trailer is written when the encoder drops.
            let mut encoder = ImageGifEncoder::new(&mut output);
            encoder
                .encode(data, width, height, image::ColorType::Rgba8)
                .map_err(|e| encode_failed("gif", e))?;
        }

        Ok(EncodedImage::new(output, EngineFormat::Gif))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// TIFF encoder using the image crate
pub struct TiffEncoder;

impl ImageEncoder for TiffEncoder {
    fn format(&self) -> EngineFormat {
        EngineFormat::Tiff
    }

    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, AppError> {
        use image::codecs::tiff::TiffEncoder as ImageTiffEncoder;
        use image::ImageEncoder as _;

        let mut output = Cursor::new(Vec::new());
        ImageTiffEncoder::new(&mut output)
            .write_image(data, width, height, image::ColorType::Rgba8)
            .map_err(|e| encode_failed("tiff", e))?;

        Ok(EncodedImage::new(output.into_inner(), EngineFormat::Tiff))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// AVIF encoder using `ravif`
pub struct AvifEncoder {
    /// Speed preset (1-10, where 1 is slowest/best quality)
    pub speed: u8,
}

impl Default for AvifEncoder {
    fn default() -> Self {
        Self { speed: 6 }
    }
}

impl ImageEncoder for AvifEncoder {
    fn format(&self) -> EngineFormat {
        EngineFormat::Avif
    }

    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, AppError> {
        use rgb::FromSlice;

        let pixels = imgref::Img::new(data.as_rgba(), width as usize, height as usize);
        let encoded = ravif::Encoder::new()
            .with_quality(quality.quality as f32)
            .with_speed(self.speed.clamp(1, 10))
            .encode_rgba(pixels)
            .map_err(|e| encode_failed("avif", e))?;

        Ok(EncodedImage::new(encoded.avif_file, EngineFormat::Avif))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// Factory for creating encoders based on output format
pub struct EncoderFactory;

impl EncoderFactory {
    /// Create an encoder for the format, `None` when it cannot be written.
    pub fn create(format: EngineFormat) -> Option<Box<dyn ImageEncoder>> {
        match format {
            EngineFormat::Jpeg => Some(Box::new(JpegEncoder)),
            EngineFormat::Png => Some(Box::new(PngEncoder)),
            EngineFormat::WebP => Some(Box::new(WebPEncoder)),
            EngineFormat::Gif => Some(Box::new(GifEncoder)),
            EngineFormat::Tiff => Some(Box::new(TiffEncoder)),
            EngineFormat::Avif => Some(Box::new(AvifEncoder::default())),
            EngineFormat::Pdf | EngineFormat::Heif | EngineFormat::Svg => None,
        }
    }
}

/// Convert RGBA to RGB by discarding alpha channel
fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for chunk in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&chunk[..3]);
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pixels() -> Vec<u8> {
        vec![
            255, 0, 0, 255, // Red
            0, 255, 0, 255, // Green
            0, 0, 255, 255, // Blue
            255, 255, 255, 128, // Semi-transparent white
        ]
    }

    #[test]
    fn test_encoder_quality_clamps_values() {
        assert_eq!(EncoderQuality::with_quality(150).quality, 100);
        assert_eq!(EncoderQuality::with_quality(0).quality, 1);
        assert_eq!(EncoderQuality::default().with_effort(15).effort, 10);
    }

    #[test]
    fn test_factory_covers_writable_formats() {
        for format in [
            EngineFormat::Jpeg,
            EngineFormat::Png,
            EngineFormat::WebP,
            EngineFormat::Gif,
            EngineFormat::Tiff,
            EngineFormat::Avif,
        ] {
            let encoder = EncoderFactory::create(format).unwrap();
            assert_eq!(encoder.format(), format);
        }
        assert!(EncoderFactory::create(EngineFormat::Pdf).is_none());
        assert!(EncoderFactory::create(EngineFormat::Heif).is_none());
        assert!(EncoderFactory::create(EngineFormat::Svg).is_none());
    }

    #[test]
    fn test_rgba_to_rgb() {
        let rgba = vec![255, 128, 64, 255, 0, 0, 0, 128];
        assert_eq!(rgba_to_rgb(&rgba), vec![255, 128, 64, 0, 0, 0]);
    }

    #[test]
    fn test_jpeg_encoder_produces_output() {
        let encoded = JpegEncoder
            .encode(&sample_pixels(), 2, 2, EncoderQuality::default())
            .unwrap();
        assert_eq!(&encoded.data[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_png_encoder_produces_output() {
        for effort in [0, 2] {
            let quality = EncoderQuality::default().with_effort(effort);
            let encoded = PngEncoder.encode(&sample_pixels(), 2, 2, quality).unwrap();
            assert_eq!(&encoded.data[0..4], &[0x89, 0x50, 0x4E, 0x47]);
        }
    }

    #[test]
    fn test_webp_encoder_produces_output() {
        let encoded = WebPEncoder
            .encode(&sample_pixels(), 2, 2, EncoderQuality::default())
            .unwrap();
        assert_eq!(&encoded.data[0..4], b"RIFF");
        assert_eq!(&encoded.data[8..12], b"WEBP");
    }

    #[test]
    fn test_gif_and_tiff_encoders_produce_output() {
        let gif = GifEncoder
            .encode(&sample_pixels(), 2, 2, EncoderQuality::default())
            .unwrap();
        assert_eq!(&gif.data[0..3], b"GIF");

        let tiff = TiffEncoder
            .encode(&sample_pixels(), 2, 2, EncoderQuality::default())
            .unwrap();
        assert!(tiff.data.starts_with(b"II*\0") || tiff.data.starts_with(b"MM\0*"));
    }

    #[test]
    fn test_avif_encoder_produces_output() {
        let encoder = AvifEncoder { speed: 10 };
        let encoded = encoder
            .encode(&sample_pixels(), 2, 2, EncoderQuality::with_quality(50))
            .unwrap();
        assert_eq!(&encoded.data[4..8], b"ftyp");
    }
}
