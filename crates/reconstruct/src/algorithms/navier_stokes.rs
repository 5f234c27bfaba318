//! Diffusion-based inpainting in the spirit of Bertalmio's Navier-Stokes method.
//!
//! The hole is first filled along the marching front with weights that favour
//! neighbors lying on the local isophote, so level lines arriving at the
//! boundary are carried inward. Harmonic relaxation sweeps then drive the
//! discrete Laplacian inside the hole toward zero while the known boundary
//! stays fixed, which smooths the transport result into the surroundings.

use image::RgbImage;
use tracing::debug;

use crate::{
    error::{ReconstructError, Result},
    traits::InpaintEstimator,
    types::Mask,
};
use super::{
    canvas::{Canvas, effective_radius},
    marching::MarchingFront,
};

/// Relaxation sweeps per pixel of radius.
const SWEEPS_PER_RADIUS: u32 = 8;
/// Gradients weaker than this carry no usable isophote direction.
const MIN_GRADIENT: f32 = 1.0e-3;
/// Keeps off-isophote neighbors from vanishing entirely.
const ISOPHOTE_FLOOR: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct NavierStokesEstimator {
    pub radius: u32,
}

impl Default for NavierStokesEstimator {
    fn default() -> Self {
        Self { radius: 3 }
    }
}

impl NavierStokesEstimator {
    pub fn new(radius: u32) -> Self {
        Self { radius }
    }

    /// Relaxation sweeps for an image of the given size.
    fn sweeps(&self, width: u32, height: u32) -> u32 {
        SWEEPS_PER_RADIUS.saturating_mul(effective_radius(self.radius, width, height))
    }
}

impl InpaintEstimator for NavierStokesEstimator {
    fn name(&self) -> &'static str {
        "navier_stokes"
    }

    fn inpaint(&self, image: &RgbImage, mask: &Mask) -> Result<RgbImage> {
        mask.ensure_dimensions(image.dimensions())?;
        if self.radius == 0 {
            return Err(ReconstructError::invalid("inpaint_radius", self.radius, "must be positive"));
        }

        let radius = effective_radius(self.radius, image.width(), image.height()) as isize;
        let mut canvas = Canvas::from_image(image);
        let mut front = MarchingFront::new(mask);
        let mut order = Vec::with_capacity(mask.occluded_count());

        front.march(|front, x, y| {
            if let Some(value) = transport(&canvas, front, x, y, radius) {
                canvas.set(x, y, value);
            }
            order.push((x, y));
        });

        let sweeps = self.sweeps(image.width(), image.height());
        let (width, height) = (image.width() as usize, image.height() as usize);
        for _ in 0..sweeps {
            relax(&mut canvas, &order, width, height);
        }

        debug!(filled = order.len(), sweeps, "navier-stokes pass finished");
        Ok(canvas.into_image(image, mask))
    }
}

/// Isophote-weighted average of the settled pixels around `(x, y)`.
fn transport(canvas: &Canvas, front: &MarchingFront, x: usize, y: usize, radius: isize) -> Option<[f32; 3]> {
    let (width, height) = (front.width() as isize, front.height() as isize);
    let (px, py) = (x as isize, y as isize);
    let window = || {
        ((py - radius).max(0)..=(py + radius).min(height - 1)).flat_map(move |qy| {
            ((px - radius).max(0)..=(px + radius).min(width - 1)).map(move |qx| (qx, qy))
        })
    };
    let in_reach = |qx: isize, qy: isize| {
        let (rx, ry) = (px - qx, py - qy);
        let length_sq = rx * rx + ry * ry;
        length_sq != 0 && length_sq <= radius * radius && front.is_settled(qx as usize, qy as usize)
    };

    // Local brightness gradient, averaged with inverse squared distance.
    let (mut gx, mut gy) = (0.0f32, 0.0f32);
    for (qx, qy) in window().filter(|&(qx, qy)| in_reach(qx, qy)) {
        let (rx, ry) = ((px - qx) as f32, (py - qy) as f32);
        let w = 1.0 / (rx * rx + ry * ry);
        let gradient = canvas.gradient(front, qx as usize, qy as usize, (x, y));
        gx += w * (gradient[0].0 + gradient[1].0 + gradient[2].0) / 3.0;
        gy += w * (gradient[0].1 + gradient[1].1 + gradient[2].1) / 3.0;
    }
    let norm = (gx * gx + gy * gy).sqrt();
    // Isophotes run perpendicular to the gradient.
    let isophote = (norm > MIN_GRADIENT).then(|| (-gy / norm, gx / norm));

    let mut sum = [0.0f32; 3];
    let mut total = 0.0f32;
    for (qx, qy) in window().filter(|&(qx, qy)| in_reach(qx, qy)) {
        let (rx, ry) = ((px - qx) as f32, (py - qy) as f32);
        let length_sq = rx * rx + ry * ry;
        let alignment = match isophote {
            Some((ix, iy)) => (rx * ix + ry * iy).abs() / length_sq.sqrt() + ISOPHOTE_FLOOR,
            None => 1.0,
        };
        let weight = alignment / length_sq;
        let value = canvas.get(qx as usize, qy as usize);
        for c in 0..3 {
            sum[c] += weight * value[c];
        }
        total += weight;
    }

    (total > 0.0).then(|| sum.map(|s| s / total))
}

/// One Gauss-Seidel sweep of the discrete Laplace equation over the filled pixels.
fn relax(canvas: &mut Canvas, order: &[(usize, usize)], width: usize, height: usize) {
    for &(x, y) in order {
        let mut sum = [0.0f32; 3];
        let mut count = 0.0f32;
        let neighbors = [
            x.checked_sub(1).map(|nx| (nx, y)),
            (x + 1 < width).then_some((x + 1, y)),
            y.checked_sub(1).map(|ny| (x, ny)),
            (y + 1 < height).then_some((x, y + 1)),
        ];
        for (nx, ny) in neighbors.into_iter().flatten() {
            let value = canvas.get(nx, ny);
            for c in 0..3 {
                sum[c] += value[c];
            }
            count += 1.0;
        }
        if count > 0.0 {
            canvas.set(x, y, sum.map(|s| s / count));
        }
    }
}
