//! Raster extraction: surface bytes to a portable image
//!
//! GDI hands back 32-bit pixels in B, G, R, X order, and device-independent
//! bitmaps are stored bottom-up unless explicitly requested otherwise. The
//! extractor normalizes both into a top-down RGB8 [`RasterImage`] without
//! resizing or touching colour values.
//!
//! A render call can report success and still leave nothing behind. Zero
//! bytes of pixel data are therefore a failure, never a black image.

use image::RgbImage;

use crate::error::{CaptureError, CaptureResult};

use super::{raster::RasterImage, traits::CaptureSurface};

/// Bytes per source pixel (B, G, R, unused)
pub const BYTES_PER_PIXEL: usize = 4;

/// Vertical order of rows in a [`RawBitmap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// First row in memory is the top of the image
    TopDown,
    /// First row in memory is the bottom of the image
    BottomUp,
}

/// Plain-bytes snapshot of a surface in 32-bit BGRX layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBitmap {
    pub width:     u32,
    pub height:    u32,
    /// Bytes per row, at least `width * 4`
    pub stride:    usize,
    pub row_order: RowOrder,
    pub bytes:     Vec<u8>,
}

impl RawBitmap {
    /// Builds a tightly packed bitmap (stride of exactly `width * 4`)
    pub fn packed(width: u32, height: u32, row_order: RowOrder, bytes: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width as usize * BYTES_PER_PIXEL,
            row_order,
            bytes,
        }
    }
}

/// Reads a surface's pixels and converts them to a [`RasterImage`]
pub fn extract<S: CaptureSurface>(surface: &mut S) -> CaptureResult<RasterImage> {
    let raw = surface.read_pixels()?;
    if raw.width != surface.width() || raw.height != surface.height() {
        return Err(corrupt(format!(
            "surface is {}x{} but read back {}x{}",
            surface.width(),
            surface.height(),
            raw.width,
            raw.height
        )));
    }
    convert(&raw)
}

/// Converts BGRX bytes in either row order to top-down RGB8
pub fn convert(raw: &RawBitmap) -> CaptureResult<RasterImage> {
    if raw.bytes.is_empty() {
        return Err(corrupt("zero-length pixel data".to_string()));
    }
    if raw.width == 0 || raw.height == 0 {
        return Err(corrupt(format!("degenerate bitmap {}x{}", raw.width, raw.height)));
    }

    let width = raw.width as usize;
    let height = raw.height as usize;
    let row_bytes = width
        .checked_mul(BYTES_PER_PIXEL)
        .ok_or_else(|| corrupt("row size overflows".to_string()))?;

    if raw.stride < row_bytes {
        return Err(corrupt(format!(
            "stride {} is shorter than a {width}-pixel row",
            raw.stride
        )));
    }

    // The last row only needs its pixels, not its padding
    let needed = raw
        .stride
        .checked_mul(height - 1)
        .and_then(|n| n.checked_add(row_bytes))
        .ok_or_else(|| corrupt("bitmap size overflows".to_string()))?;
    if raw.bytes.len() < needed {
        return Err(corrupt(format!(
            "expected at least {needed} bytes, got {}",
            raw.bytes.len()
        )));
    }

    let mut rgb = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let src_row = match raw.row_order {
            RowOrder::TopDown => y,
            RowOrder::BottomUp => height - 1 - y,
        };
        let start = src_row * raw.stride;
        for px in raw.bytes[start..start + row_bytes].chunks_exact(BYTES_PER_PIXEL) {
            rgb.extend_from_slice(&[px[2], px[1], px[0]]);
        }
    }

    let image = RgbImage::from_raw(raw.width, raw.height, rgb)
        .ok_or_else(|| corrupt("converted buffer does not match dimensions".to_string()))?;
    Ok(RasterImage::from_rgb8(image))
}

fn corrupt(reason: String) -> CaptureError {
    CaptureError::EmptyOrCorruptBitmap { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x2 image: red, green on top; blue, white below
    fn bgrx_rows() -> (Vec<u8>, Vec<u8>) {
        let top = vec![0, 0, 255, 0, 0, 255, 0, 0];
        let bottom = vec![255, 0, 0, 0, 255, 255, 255, 0];
        (top, bottom)
    }

    fn assert_quadrants(img: &RasterImage) {
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.pixel(0, 0), Some([255, 0, 0]));
        assert_eq!(img.pixel(1, 0), Some([0, 255, 0]));
        assert_eq!(img.pixel(0, 1), Some([0, 0, 255]));
        assert_eq!(img.pixel(1, 1), Some([255, 255, 255]));
    }

    #[test]
    fn test_convert_top_down() {
        let (top, bottom) = bgrx_rows();
        let raw = RawBitmap::packed(2, 2, RowOrder::TopDown, [top, bottom].concat());
        assert_quadrants(&convert(&raw).unwrap());
    }

    #[test]
    fn test_convert_bottom_up() {
        let (top, bottom) = bgrx_rows();
        let raw = RawBitmap::packed(2, 2, RowOrder::BottomUp, [bottom, top].concat());
        assert_quadrants(&convert(&raw).unwrap());
    }

    #[test]
    fn test_convert_padded_stride() {
        let (mut top, mut bottom) = bgrx_rows();
        top.extend_from_slice(&[9, 9, 9, 9]);
        bottom.extend_from_slice(&[9, 9, 9, 9]);

        let raw = RawBitmap {
            width:     2,
            height:    2,
            stride:    12,
            row_order: RowOrder::TopDown,
            bytes:     [top, bottom].concat(),
        };
        assert_quadrants(&convert(&raw).unwrap());
    }

    #[test]
    fn test_convert_rejects_empty() {
        let raw = RawBitmap::packed(640, 480, RowOrder::BottomUp, Vec::new());
        let err = convert(&raw).unwrap_err();

        assert!(matches!(err, CaptureError::EmptyOrCorruptBitmap { .. }));
        assert!(err.to_string().contains("zero-length"));
    }

    #[test]
    fn test_convert_rejects_short_buffer() {
        let raw = RawBitmap::packed(4, 4, RowOrder::TopDown, vec![0; 4 * 4 * 4 - 1]);
        assert!(matches!(convert(&raw), Err(CaptureError::EmptyOrCorruptBitmap { .. })));
    }

    #[test]
    fn test_convert_rejects_narrow_stride() {
        let raw = RawBitmap {
            width:     4,
            height:    1,
            stride:    8,
            row_order: RowOrder::TopDown,
            bytes:     vec![0; 16],
        };
        assert!(convert(&raw).is_err());
    }

    #[test]
    fn test_convert_all_black_is_valid() {
        let raw = RawBitmap::packed(3, 3, RowOrder::TopDown, vec![0; 36]);
        let img = convert(&raw).unwrap();
        assert!(img.as_bytes().iter().all(|&b| b == 0));
    }
}
