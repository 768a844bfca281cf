//! Portable pixel buffer handed back to callers
//!
//! A [`RasterImage`] is always 8-bit RGB, top-down, with no padding between
//! rows. It wraps `image::DynamicImage` so callers can hand it to the rest
//! of the `image` ecosystem through [`RasterImage::into_inner`].
//!
//! # Examples
//!
//! ```
//! use wincap_core::{capture::RasterImage, model::Region};
//!
//! let img = RasterImage::from_test_pattern(816, 639);
//! let client = img.crop(Region::new(8, 31, 800, 600)).unwrap();
//! assert_eq!(client.dimensions(), (800, 600));
//! ```

use std::path::Path;

use image::{DynamicImage, RgbImage};

use crate::{
    error::{CaptureError, CaptureResult},
    model::Region,
    util::encode,
};

/// RGB8 image produced by a successful capture
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
    inner: DynamicImage,
}

impl RasterImage {
    /// Wraps an RGB8 buffer
    pub fn from_rgb8(image: RgbImage) -> Self {
        Self {
            inner: DynamicImage::ImageRgb8(image),
        }
    }

    /// Wraps any `DynamicImage`, converting it to RGB8 if needed
    pub fn new(image: DynamicImage) -> Self {
        match image {
            DynamicImage::ImageRgb8(rgb) => Self::from_rgb8(rgb),
            other => Self::from_rgb8(other.to_rgb8()),
        }
    }

    /// Copies the given region into a new image
    ///
    /// The region must lie entirely inside the image; this never clamps.
    pub fn crop(&self, region: Region) -> CaptureResult<Self> {
        let (img_width, img_height) = self.dimensions();

        let right = u64::from(region.x) + u64::from(region.width);
        let bottom = u64::from(region.y) + u64::from(region.height);
        if region.width == 0
            || region.height == 0
            || right > u64::from(img_width)
            || bottom > u64::from(img_height)
        {
            return Err(CaptureError::CropOutOfBounds {
                left:         i64::from(region.x),
                top:          i64::from(region.y),
                width:        i64::from(region.width),
                height:       i64::from(region.height),
                image_width:  img_width,
                image_height: img_height,
            });
        }

        let cropped = self
            .inner
            .crop_imm(region.x, region.y, region.width, region.height);
        Ok(Self::new(cropped))
    }

    /// Returns the dimensions of the image as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.inner.width(), self.inner.height())
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    /// Returns the pixel at (x, y), or `None` outside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        self.inner.as_rgb8()?.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Raw RGB bytes, row-major, top-down
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    pub fn to_rgb8(&self) -> RgbImage {
        self.inner.to_rgb8()
    }

    /// Encodes the image as PNG at `path`
    pub fn save_png(&self, path: &Path) -> CaptureResult<()> {
        encode::write_png(self, path)
    }

    /// Creates a gradient test image
    ///
    /// Red rises left to right, green rises top to bottom and blue is
    /// constant, so every sub-region of the pattern is distinguishable from
    /// its neighbours.
    pub fn from_test_pattern(width: u32, height: u32) -> Self {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ])
        });
        Self::from_rgb8(img)
    }

    pub fn inner(&self) -> &DynamicImage {
        &self.inner
    }

    pub fn into_inner(self) -> DynamicImage {
        self.inner
    }
}
