//! Structural edge extraction.
//!
//! Edges come from a Canny-style detector: Gaussian smoothing, Sobel
//! gradients with L1 magnitude, non-maximum suppression along the quantized
//! gradient direction and double-threshold hysteresis over 8-connected
//! chains. Edges inside the occlusion are then cleared and the remaining
//! boundary structure is grown a little way into the hole.

use image::{GrayImage, Luma, RgbImage};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use tracing::debug;

use crate::{
    config::validate_hysteresis,
    error::{ReconstructError, Result},
    traits::EdgeExtractor,
    types::{EdgeMaps, Mask},
};
use super::preprocessing::{dilate_square, luminance};

const TAN_22_5_DEG: f32 = 0.414_213_56;

/// Canny edge extractor followed by occlusion clearing and growth
#[derive(Debug, Clone)]
pub struct CannyEdgeExtractor {
    pub sigma: f32,
    /// Low hysteresis threshold as a fraction of 255
    pub low: f32,
    /// High hysteresis threshold as a fraction of 255
    pub high: f32,
    /// Number of 3x3 dilations applied to the cleared edge map
    pub grow_iterations: u8,
}

impl Default for CannyEdgeExtractor {
    fn default() -> Self {
        Self {
            sigma: 2.0,
            low: 0.1,
            high: 0.2,
            grow_iterations: 2,
        }
    }
}

impl EdgeExtractor for CannyEdgeExtractor {
    fn extract_edges(&self, image: &RgbImage, mask: &Mask) -> Result<EdgeMaps> {
        mask.ensure_dimensions(image.dimensions())?;
        let raw = detect_edges(&luminance(image), self.sigma, self.low, self.high)?;
        let edges = clear_occluded(&raw, mask);
        let grown = dilate_square(&edges, self.grow_iterations);
        debug!(
            raw = count_on(&raw),
            cleared = count_on(&edges),
            grown = count_on(&grown),
            "edge maps computed"
        );
        Ok(EdgeMaps { raw, edges, grown })
    }
}

/// Edge maps of `image` with the default growth of two 3x3 dilations.
pub fn extract_edges(image: &RgbImage, mask: &Mask, sigma: f32, low: f32, high: f32) -> Result<EdgeMaps> {
    CannyEdgeExtractor {
        sigma,
        low,
        high,
        ..CannyEdgeExtractor::default()
    }
    .extract_edges(image, mask)
}

/// Binary Canny edges of a grayscale image.
///
/// `low` and `high` are fractions of 255; the absolute magnitude thresholds
/// are their truncated products with 255.
pub fn detect_edges(gray: &GrayImage, sigma: f32, low: f32, high: f32) -> Result<GrayImage> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ReconstructError::invalid("edge_sigma", sigma, "must be a positive number"));
    }
    validate_hysteresis(low, high)?;

    let blurred = imageproc::filter::gaussian_blur_f32(gray, sigma);
    let gx = horizontal_sobel(&blurred);
    let gy = vertical_sobel(&blurred);

    let (width, height) = gray.dimensions();
    let magnitude: Vec<f32> = gx
        .pixels()
        .zip(gy.pixels())
        .map(|(x, y)| f32::from(x[0]).abs() + f32::from(y[0]).abs())
        .collect();

    let thinned = non_maximum_suppression(&magnitude, &gx, &gy, width as usize, height as usize);
    let low_abs = (low * 255.0).floor();
    let high_abs = (high * 255.0).floor();
    Ok(hysteresis(&thinned, width, height, low_abs, high_abs))
}

/// Keep only magnitudes that peak along the gradient direction; others become 0.
fn non_maximum_suppression(
    magnitude: &[f32],
    gx: &image::ImageBuffer<Luma<i16>, Vec<i16>>,
    gy: &image::ImageBuffer<Luma<i16>, Vec<i16>>,
    width: usize,
    height: usize,
) -> Vec<f32> {
    let at = |x: isize, y: isize| -> f32 {
        if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
            0.0
        } else {
            magnitude[y as usize * width + x as usize]
        }
    };

    let mut thinned = vec![0.0f32; magnitude.len()];
    for y in 0..height {
        for x in 0..width {
            let mag = magnitude[y * width + x];
            if mag <= 0.0 {
                continue;
            }
            let dx = f32::from(gx.get_pixel(x as u32, y as u32)[0]);
            let dy = f32::from(gy.get_pixel(x as u32, y as u32)[0]);
            let (abs_dx, abs_dy) = (dx.abs(), dy.abs());
            let (xi, yi) = (x as isize, y as isize);

            // Neighbor offset along the gradient, quantized to 4 directions.
            let (ox, oy) = if abs_dy <= abs_dx * TAN_22_5_DEG {
                (1, 0)
            } else if abs_dx <= abs_dy * TAN_22_5_DEG {
                (0, 1)
            } else if (dx >= 0.0) == (dy >= 0.0) {
                (1, 1)
            } else {
                (1, -1)
            };

            let before = at(xi - ox, yi - oy);
            let after = at(xi + ox, yi + oy);
            // Asymmetric comparison keeps exactly one pixel of a flat ridge.
            if mag > before && mag >= after {
                thinned[y * width + x] = mag;
            }
        }
    }
    thinned
}

/// Double-threshold linking: strong pixels seed, candidates join when
/// 8-connected to a seed.
fn hysteresis(thinned: &[f32], width: u32, height: u32, low: f32, high: f32) -> GrayImage {
    let (w, h) = (width as usize, height as usize);
    let mut output = GrayImage::new(width, height);
    let is_candidate = |v: f32| v > 0.0 && v >= low;

    let mut stack: Vec<usize> = Vec::new();
    for (index, &value) in thinned.iter().enumerate() {
        if value > 0.0 && value >= high {
            stack.push(index);
        }
    }

    let out: &mut [u8] = &mut output;
    for &index in &stack {
        out[index] = 255;
    }

    while let Some(index) = stack.pop() {
        let (x, y) = ((index % w) as isize, (index / w) as isize);
        for ny in (y - 1)..=(y + 1) {
            for nx in (x - 1)..=(x + 1) {
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let neighbor = ny as usize * w + nx as usize;
                if out[neighbor] == 0 && is_candidate(thinned[neighbor]) {
                    out[neighbor] = 255;
                    stack.push(neighbor);
                }
            }
        }
    }

    output
}

/// Copy of `edges` with every occluded pixel set to 0.
pub fn clear_occluded(edges: &GrayImage, mask: &Mask) -> GrayImage {
    let mut cleared = edges.clone();
    for (edge, occluded) in cleared.iter_mut().zip(mask.as_image().iter()) {
        if *occluded != 0 {
            *edge = 0;
        }
    }
    cleared
}

fn count_on(image: &GrayImage) -> usize {
    image.as_raw().iter().filter(|&&v| v != 0).count()
}
