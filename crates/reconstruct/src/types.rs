use image::{GrayImage, Luma, RgbImage, imageops};

use crate::error::{ReconstructError, Result};

/// Binary occlusion mask. 255 marks pixels to reconstruct, 0 marks known pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask(GrayImage);

impl Mask {
    /// Build a mask from any grayscale image; every nonzero sample becomes 255.
    pub fn from_binary(mut image: GrayImage) -> Self {
        for pixel in image.pixels_mut() {
            if pixel[0] != 0 {
                pixel[0] = 255;
            }
        }
        Self(image)
    }

    /// An all-known mask.
    pub fn empty(width: u32, height: u32) -> Self {
        Self(GrayImage::new(width, height))
    }

    /// Mask with a filled axis-aligned rectangle of occluded pixels.
    pub fn from_rect(width: u32, height: u32, x: u32, y: u32, rect_width: u32, rect_height: u32) -> Self {
        let mut image = GrayImage::new(width, height);
        for yy in y..(y + rect_height).min(height) {
            for xx in x..(x + rect_width).min(width) {
                image.put_pixel(xx, yy, Luma([255]));
            }
        }
        Self(image)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn is_occluded(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y)[0] != 0
    }

    /// Number of occluded pixels
    pub fn occluded_count(&self) -> usize {
        self.0.as_raw().iter().filter(|&&v| v != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.as_raw().iter().all(|&v| v == 0)
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_image(self) -> GrayImage {
        self.0
    }

    /// Fail with `DimensionMismatch` unless the mask covers exactly `dimensions`.
    pub fn ensure_dimensions(&self, dimensions: (u32, u32)) -> Result<()> {
        check_dimensions("mask", dimensions, self.dimensions())
    }
}

pub(crate) fn check_dimensions(what: &'static str, image: (u32, u32), other: (u32, u32)) -> Result<()> {
    if image == other {
        return Ok(());
    }
    Err(ReconstructError::DimensionMismatch {
        what,
        image_width: image.0,
        image_height: image.1,
        width: other.0,
        height: other.1,
    })
}

/// Edge products of the structural edge extractor.
#[derive(Debug, Clone)]
pub struct EdgeMaps {
    /// Edges of the whole image, diagnostics only
    pub raw: GrayImage,
    /// Edges with everything inside the occlusion removed
    pub edges: GrayImage,
    /// `edges` grown toward the occlusion interior
    pub grown: GrayImage,
}

/// Everything produced while reconstructing a single image.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub original: RgbImage,
    pub mask: Mask,
    pub edges: EdgeMaps,
    pub result: RgbImage,
}

impl Reconstruction {
    /// Original and reconstructed images side by side.
    pub fn comparison(&self) -> RgbImage {
        side_by_side(&self.original, &self.result)
    }
}

/// Concatenate two images horizontally. The canvas height is the taller of the two.
pub fn side_by_side(left: &RgbImage, right: &RgbImage) -> RgbImage {
    let height = left.height().max(right.height());
    let mut canvas = RgbImage::new(left.width() + right.width(), height);
    imageops::replace(&mut canvas, left, 0, 0);
    imageops::replace(&mut canvas, right, i64::from(left.width()), 0);
    canvas
}
