//! PNG encoding for captured images
//!
//! Captures are persisted only as PNG, the one lossless format every image
//! viewer reads. Encoding happens in memory first so a failed encode never
//! leaves a truncated file behind.
//!
//! # Examples
//!
//! ```
//! use wincap_core::{capture::RasterImage, util::encode::encode_png};
//!
//! let img = RasterImage::from_test_pattern(320, 200);
//! let png_bytes = encode_png(&img).unwrap();
//! assert_eq!(&png_bytes[1..4], b"PNG");
//! ```

use std::{fs, io::Cursor, path::Path};

use image::{
    ImageEncoder,
    codecs::png::{CompressionType, FilterType, PngEncoder},
};

use crate::{
    capture::RasterImage,
    error::{CaptureError, CaptureResult},
};

/// Encodes an image as PNG with default compression
pub fn encode_png(buffer: &RasterImage) -> CaptureResult<Vec<u8>> {
    encode_png_with_compression(buffer, CompressionType::Default)
}

/// Encodes an image as PNG with the given compression level
///
/// `Fast` is noticeably quicker on large captures at the cost of file size;
/// the output is lossless either way.
pub fn encode_png_with_compression(
    buffer: &RasterImage,
    compression: CompressionType,
) -> CaptureResult<Vec<u8>> {
    let mut output = Vec::new();

    let encoder =
        PngEncoder::new_with_quality(Cursor::new(&mut output), compression, FilterType::Adaptive);

    let rgb = buffer.to_rgb8();
    let (width, height) = rgb.dimensions();

    encoder
        .write_image(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .map_err(|e| CaptureError::EncodingFailed {
            format: "png".to_string(),
            reason: e.to_string(),
        })?;

    Ok(output)
}

/// Encodes an image as PNG and writes it to `path`
///
/// The parent directory must already exist.
pub fn write_png(buffer: &RasterImage, path: &Path) -> CaptureResult<()> {
    let bytes = encode_png(buffer)?;
    fs::write(path, bytes)?;

    tracing::debug!(path = %path.display(), width = buffer.width(), height = buffer.height(), "Wrote PNG");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    #[test]
    fn test_encode_png_default() {
        let img = RasterImage::from_test_pattern(100, 100);
        let bytes = encode_png(&img).unwrap();

        assert!(!bytes.is_empty());
        assert_eq!(&bytes[0..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_encode_png_lossless() {
        let img = RasterImage::from_test_pattern(64, 48);
        let encoded = encode_png(&img).unwrap();

        let decoded = image::load_from_memory(&encoded).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), img.dimensions());
        assert_eq!(decoded.as_raw().as_slice(), img.as_bytes());
    }

    #[test]
    fn test_encode_png_fast_compression() {
        let img = RasterImage::from_test_pattern(640, 480);
        let fast = encode_png_with_compression(&img, CompressionType::Fast).unwrap();
        assert_eq!(&fast[0..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_write_png_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.png");

        let img = RasterImage::from_test_pattern(32, 16);
        write_png(&img, &path).unwrap();

        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(&on_disk[0..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_write_png_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("capture.png");

        let err = write_png(&RasterImage::from_test_pattern(8, 8), &path).unwrap_err();
        assert!(matches!(err, CaptureError::IoError(_)));
    }
}
