//! Fast marching inpainting after Telea (2004).
//!
//! Every occluded pixel is estimated from the settled pixels within
//! `radius`, each contributing its value plus a first-order gradient
//! correction. Contributions are weighted by alignment with the marching
//! normal, inverse cubed distance and similarity of arrival time.

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

const MIN_DIRECTION: f32 = 0.01;

#[derive(Debug, Clone)]
pub struct TeleaEstimator {
    pub radius: u32,
}

impl Default for TeleaEstimator {
    fn default() -> Self {
        Self { radius: 3 }
    }
}

impl TeleaEstimator {
    pub fn new(radius: u32) -> Self {
        Self { radius }
    }
}

impl InpaintEstimator for TeleaEstimator {
    fn name(&self) -> &'static str {
        "telea"
    }

    fn inpaint(&self, image: &RgbImage, mask: &Mask) -> Result<RgbImage> {
        mask.ensure_dimensions(image.dimensions())?;
        if self.radius == 0 {
            return Err(ReconstructError::invalid("inpaint_radius", self.radius, "must be positive"));
        }

        let radius = effective_radius(self.radius, image.width(), image.height()) as isize;
        let mut canvas = Canvas::from_image(image);
        let mut front = MarchingFront::new(mask);
        let mut filled = 0usize;

        front.march(|front, x, y| {
            let value = estimate(&canvas, front, x, y, radius);
            if let Some(value) = value {
                canvas.set(x, y, value);
            }
            filled += 1;
        });

        debug!(filled, occluded = mask.occluded_count(), "telea pass finished");
        Ok(canvas.into_image(image, mask))
    }
}

fn estimate(canvas: &Canvas, front: &MarchingFront, x: usize, y: usize, radius: isize) -> Option<[f32; 3]> {
    let (width, height) = (front.width() as isize, front.height() as isize);
    let (px, py) = (x as isize, y as isize);
    let (normal_x, normal_y) = front.time_gradient(x, y);
    let time = front.time(x, y);

    let mut sum = [0.0f32; 3];
    let mut total = 0.0f32;

    for qy in (py - radius).max(0)..=(py + radius).min(height - 1) {
        for qx in (px - radius).max(0)..=(px + radius).min(width - 1) {
            let (rx, ry) = ((px - qx) as f32, (py - qy) as f32);
            let length_sq = rx * rx + ry * ry;
            if length_sq == 0.0 || length_sq > (radius * radius) as f32 {
                continue;
            }
            let (ux, uy) = (qx as usize, qy as usize);
            if !front.is_settled(ux, uy) {
                continue;
            }

            let distance = 1.0 / (length_sq * length_sq.sqrt());
            let level = 1.0 / (1.0 + (front.time(ux, uy) - time).abs());
            let mut direction = rx * normal_x + ry * normal_y;
            if direction.abs() <= MIN_DIRECTION {
                direction = 1.0e-6;
            }
            let weight = (distance * level * direction).abs();

            let value = canvas.get(ux, uy);
            let gradient = canvas.gradient(front, ux, uy, (x, y));
            for c in 0..3 {
                let (gx, gy) = gradient[c];
                sum[c] += weight * (value[c] + gx * rx + gy * ry);
            }
            total += weight;
        }
    }

    (total > 0.0).then(|| sum.map(|s| (s / total).clamp(0.0, 255.0)))
}
