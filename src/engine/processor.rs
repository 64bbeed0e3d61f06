//! Pixel processing
//!
//! Handles decode (with EXIF auto-orientation), resize and rotation.

use fast_image_resize::{FilterType, Image, MulDiv, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::{DynamicImage, GenericImageView, RgbaImage};
use std::io::Cursor;
use std::num::NonZeroU32;

use crate::error::AppError;

use super::{Dimensions, EngineFormat, ResizeMode, ResizeRequest, Rotation};

fn processing_failed(reason: impl Into<String>) -> AppError {
    AppError::invalid_input("image processing failed").with_source(reason.into())
}

/// Detect image format from data
pub fn detect_format(data: &[u8]) -> Option<EngineFormat> {
    if let Ok(fmt) = image::guess_format(data) {
        let detected = match fmt {
            image::ImageFormat::Png => Some(EngineFormat::Png),
            image::ImageFormat::Jpeg => Some(EngineFormat::Jpeg),
            image::ImageFormat::WebP => Some(EngineFormat::WebP),
            image::ImageFormat::Gif => Some(EngineFormat::Gif),
            image::ImageFormat::Tiff => Some(EngineFormat::Tiff),
            image::ImageFormat::Avif => Some(EngineFormat::Avif),
            _ => None,
        };
        if detected.is_some() {
            return detected;
        }
    }

    if data.starts_with(b"%PDF") {
        return Some(EngineFormat::Pdf);
    }
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        let brand = &data[8..12];
        if [b"heic", b"heix", b"mif1", b"msf1", b"hevc"]
            .iter()
            .any(|b| brand == *b)
        {
            return Some(EngineFormat::Heif);
        }
    }
    let head = String::from_utf8_lossy(&data[..data.len().min(512)]);
    if head.contains("<svg") {
        return Some(EngineFormat::Svg);
    }
    None
}

/// EXIF orientation tag (1-8) of the primary image, if any.
pub fn read_orientation(data: &[u8]) -> Option<u32> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    field.value.get_uint(0).filter(|o| (1..=8).contains(o))
}

/// Orientations 5-8 store the image transposed.
fn swaps_axes(orientation: Option<u32>) -> bool {
    matches!(orientation, Some(5..=8))
}

/// Dimensions as displayed, without decoding pixels.
pub fn read_dimensions(data: &[u8]) -> Result<Dimensions, AppError> {
    let (width, height) = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| processing_failed(e.to_string()))?
        .into_dimensions()
        .map_err(|e| processing_failed(e.to_string()))?;

    if swaps_axes(read_orientation(data)) {
        Ok(Dimensions::new(height, width))
    } else {
        Ok(Dimensions::new(width, height))
    }
}

/// Decode image data into a DynamicImage, upright.
pub fn decode_image(data: &[u8]) -> Result<DynamicImage, AppError> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| processing_failed(e.to_string()))?
        .decode()
        .map_err(|e| processing_failed(e.to_string()))?;

    Ok(match read_orientation(data) {
        Some(orientation) => apply_orientation(img, orientation),
        None => img,
    })
}

/// Undo the stored EXIF orientation.
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

pub fn rotate_image(img: DynamicImage, rotation: Rotation) -> DynamicImage {
    match rotation {
        Rotation::None => img,
        Rotation::Deg90 => img.rotate90(),
        Rotation::Deg180 => img.rotate180(),
        Rotation::Deg270 => img.rotate270(),
    }
}

/// Fill in a zero side of the target box from the source aspect ratio.
fn resolve_box(src_w: u32, src_h: u32, width: u32, height: u32) -> Result<(u32, u32), AppError> {
    match (width, height) {
        (0, 0) => Err(processing_failed("resize needs a width or a height")),
        (w, 0) => Ok((w, scale_side(src_h, w as f64 / src_w as f64))),
        (0, h) => Ok((scale_side(src_w, h as f64 / src_h as f64), h)),
        (w, h) => Ok((w, h)),
    }
}

fn scale_side(side: u32, scale: f64) -> u32 {
    ((side as f64 * scale).round() as u32).max(1)
}

/// Resize according to the request's mode.
pub fn resize_image(img: &DynamicImage, request: &ResizeRequest) -> Result<DynamicImage, AppError> {
    let (src_w, src_h) = img.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(processing_failed("source image is empty"));
    }
    let (box_w, box_h) = resolve_box(src_w, src_h, request.width, request.height)?;

    let ratio_w = box_w as f64 / src_w as f64;
    let ratio_h = box_h as f64 / src_h as f64;
    let cap = |scale: f64| {
        if request.enlarge {
            scale
        } else {
            scale.min(1.0)
        }
    };

    match request.mode {
        ResizeMode::Force => {
            let (w, h) = if request.enlarge {
                (box_w, box_h)
            } else {
                (box_w.min(src_w), box_h.min(src_h))
            };
            resample(img, w, h)
        }
        ResizeMode::Default => {
            let scale = cap(ratio_w.min(ratio_h));
            resample(img, scale_side(src_w, scale), scale_side(src_h, scale))
        }
        ResizeMode::Crop => {
            let scale = cap(ratio_w.max(ratio_h));
            let (w, h) = (scale_side(src_w, scale), scale_side(src_h, scale));
            let resized = resample(img, w, h)?;
            let (crop_w, crop_h) = (box_w.min(w), box_h.min(h));
            Ok(resized.crop_imm((w - crop_w) / 2, (h - crop_h) / 2, crop_w, crop_h))
        }
        ResizeMode::Embed => {
            let scale = cap(ratio_w.min(ratio_h));
            let (w, h) = (scale_side(src_w, scale), scale_side(src_h, scale));
            let resized = resample(img, w, h)?.to_rgba8();
            let mut canvas = RgbaImage::new(box_w, box_h);
            let left = (box_w.saturating_sub(w) / 2) as i64;
            let top = (box_h.saturating_sub(h) / 2) as i64;
            image::imageops::overlay(&mut canvas, &resized, left, top);
            Ok(DynamicImage::ImageRgba8(canvas))
        }
    }
}

/// Resample with fast_image_resize, Lanczos3, premultiplied alpha.
fn resample(img: &DynamicImage, target_w: u32, target_h: u32) -> Result<DynamicImage, AppError> {
    let (src_w, src_h) = img.dimensions();
    if (src_w, src_h) == (target_w, target_h) {
        return Ok(img.clone());
    }

    let src_width =
        NonZeroU32::new(src_w).ok_or_else(|| processing_failed("source width is 0"))?;
    let src_height =
        NonZeroU32::new(src_h).ok_or_else(|| processing_failed("source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| processing_failed("target width is 0"))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| processing_failed("target height is 0"))?;

    let mut src_image = Image::from_vec_u8(
        src_width,
        src_height,
        img.to_rgba8().into_raw(),
        PixelType::U8x4,
    )
    .map_err(|e| processing_failed(format!("cannot create source image: {:?}", e)))?;
    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mul_div = MulDiv::default();
    mul_div
        .multiply_alpha_inplace(&mut src_image.view_mut())
        .map_err(|e| processing_failed(format!("cannot premultiply alpha: {:?}", e)))?;

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| processing_failed(format!("resize failed: {:?}", e)))?;

    mul_div
        .divide_alpha_inplace(&mut dst_image.view_mut())
        .map_err(|e| processing_failed(format!("cannot unpremultiply alpha: {:?}", e)))?;

    let rgba_image = RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| processing_failed("cannot create output image buffer"))?;

    Ok(DynamicImage::ImageRgba8(rgba_image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};

    fn image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        }))
    }

    fn encoded(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }

    fn request(width: u32, height: u32, mode: ResizeMode, enlarge: bool) -> ResizeRequest {
        ResizeRequest {
            width,
            height,
            mode,
            enlarge,
        }
    }

    #[test]
    fn test_detect_format() {
        let img = image(2, 2);
        assert_eq!(
            detect_format(&encoded(&img, ImageFormat::Png)),
            Some(EngineFormat::Png)
        );
        assert_eq!(
            detect_format(&encoded(&img, ImageFormat::Gif)),
            Some(EngineFormat::Gif)
        );
        assert_eq!(detect_format(b"%PDF-1.7\n"), Some(EngineFormat::Pdf));
        assert_eq!(
            detect_format(b"<?xml version=\"1.0\"?><svg xmlns=\"http://www.w3.org/2000/svg\"/>"),
            Some(EngineFormat::Svg)
        );
        assert_eq!(detect_format(&[0, 1, 2, 3, 4, 5]), None);
    }

    #[test]
    fn test_decode_invalid_data() {
        let err = decode_image(&[0, 1, 2, 3, 4, 5]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_read_dimensions_without_exif() {
        let data = encoded(&image(7, 3), ImageFormat::Png);
        assert_eq!(read_dimensions(&data).unwrap(), Dimensions::new(7, 3));
        assert_eq!(read_orientation(&data), None);
    }

    #[test]
    fn test_apply_orientation_swaps_for_transposed_tags() {
        for orientation in 1..=8 {
            let out = apply_orientation(image(4, 2), orientation);
            let expected = if orientation >= 5 { (2, 4) } else { (4, 2) };
            assert_eq!(out.dimensions(), expected, "orientation {}", orientation);
        }
    }

    #[test]
    fn test_resize_width_only_keeps_aspect() {
        let out = resize_image(&image(2000, 1000), &request(1000, 0, ResizeMode::Default, false))
            .unwrap();
        assert_eq!(out.dimensions(), (1000, 500));
    }

    #[test]
    fn test_resize_default_fits_inside() {
        let out =
            resize_image(&image(400, 200), &request(100, 100, ResizeMode::Default, false)).unwrap();
        assert_eq!(out.dimensions(), (100, 50));
    }

    #[test]
    fn test_resize_crop_covers_box() {
        let out =
            resize_image(&image(400, 200), &request(100, 100, ResizeMode::Crop, false)).unwrap();
        assert_eq!(out.dimensions(), (100, 100));
    }

    #[test]
    fn test_resize_embed_pads_to_box() {
        let out =
            resize_image(&image(400, 200), &request(100, 100, ResizeMode::Embed, false)).unwrap();
        assert_eq!(out.dimensions(), (100, 100));
        let rgba = out.to_rgba8();
        assert_eq!(rgba.get_pixel(50, 0)[3], 0);
        assert_eq!(rgba.get_pixel(50, 50)[3], 255);
    }

    #[test]
    fn test_resize_force_stretches() {
        let out =
            resize_image(&image(400, 200), &request(50, 80, ResizeMode::Force, false)).unwrap();
        assert_eq!(out.dimensions(), (50, 80));
    }

    #[test]
    fn test_resize_without_enlargement() {
        let out =
            resize_image(&image(40, 20), &request(400, 0, ResizeMode::Default, false)).unwrap();
        assert_eq!(out.dimensions(), (40, 20));

        let out =
            resize_image(&image(40, 20), &request(400, 400, ResizeMode::Force, false)).unwrap();
        assert_eq!(out.dimensions(), (40, 20));

        let out =
            resize_image(&image(40, 20), &request(80, 0, ResizeMode::Default, true)).unwrap();
        assert_eq!(out.dimensions(), (80, 40));
    }

    #[test]
    fn test_rotate_image() {
        assert_eq!(rotate_image(image(4, 2), Rotation::Deg90).dimensions(), (2, 4));
        assert_eq!(rotate_image(image(4, 2), Rotation::Deg180).dimensions(), (4, 2));
        assert_eq!(rotate_image(image(4, 2), Rotation::Deg270).dimensions(), (2, 4));
        assert_eq!(rotate_image(image(4, 2), Rotation::None).dimensions(), (4, 2));
    }
}
