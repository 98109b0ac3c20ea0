//! Screenshot preparation for the OCR upload.
//!
//! The provider rejects images over its payload and dimension limits, so
//! oversized screenshots are downscaled and re-encoded before upload.
//! Scaling changes fragment coordinates, so images inside the limits are
//! passed through untouched.

use std::io::Cursor;

use image::imageops::FilterType;

/// Longest side the provider accepts.
pub const MAX_DIMENSION: u32 = 4096;
/// Raw payload ceiling — stays clear of the provider's 4MB base64 limit.
const MAX_UPLOAD_BYTES: usize = 3 * 1024 * 1024;

/// Return upload-ready bytes for a screenshot.
pub fn prepare_for_ocr(bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = (img.width(), img.height());

    if width <= MAX_DIMENSION && height <= MAX_DIMENSION && bytes.len() <= MAX_UPLOAD_BYTES {
        return Ok(bytes.to_vec());
    }

    let start = std::time::Instant::now();
    let scaled = if width > MAX_DIMENSION || height > MAX_DIMENSION {
        img.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Triangle)
    } else {
        img
    };

    // The JPEG encoder rejects alpha channels; flatten first.
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(scaled.to_rgb8())
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)?;
    log::info!(
        "[OCR] Downscaled {}x{} ({} bytes) -> {}x{} ({} bytes) in {}ms",
        width,
        height,
        bytes.len(),
        scaled.width(),
        scaled.height(),
        out.len(),
        start.elapsed().as_millis()
    );
    Ok(out)
}

/// Encode a raw RGBA buffer (e.g. a pasted clipboard image) as PNG bytes.
pub fn rgba_to_png(
    rgba: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, image::ImageError> {
    let buf: image::RgbaImage = image::ImageBuffer::from_raw(width, height, rgba.to_vec())
        .ok_or_else(|| {
            image::ImageError::Parameter(image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ))
        })?;
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(buf)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_of(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::new(width, height));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn small_image_passes_through_unchanged() {
        let bytes = png_of(640, 480);
        let prepared = prepare_for_ocr(&bytes).unwrap();
        assert_eq!(prepared, bytes);
    }

    #[test]
    fn oversized_image_is_downscaled() {
        let bytes = png_of(MAX_DIMENSION + 400, 200);
        let prepared = prepare_for_ocr(&bytes).unwrap();
        let img = image::load_from_memory(&prepared).unwrap();
        assert!(img.width() <= MAX_DIMENSION);
        assert!(img.height() <= MAX_DIMENSION);
    }

    #[test]
    fn garbage_bytes_error() {
        assert!(prepare_for_ocr(b"not an image").is_err());
    }

    #[test]
    fn rgba_roundtrip() {
        let rgba = vec![255u8; 4 * 4 * 4];
        let png = rgba_to_png(&rgba, 4, 4).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (4, 4));
    }
}
