use image::{Rgb, RgbImage};

use crate::types::Mask;
use super::marching::MarchingFront;

/// Floating point RGB working buffer for the region-filling estimators.
pub(crate) struct Canvas {
    width: usize,
    data: Vec<[f32; 3]>,
}

impl Canvas {
    pub(crate) fn from_image(image: &RgbImage) -> Self {
        let data = image
            .pixels()
            .map(|p| [f32::from(p[0]), f32::from(p[1]), f32::from(p[2])])
            .collect();
        Self {
            width: image.width() as usize,
            data,
        }
    }

    pub(crate) fn get(&self, x: usize, y: usize) -> [f32; 3] {
        self.data[y * self.width + x]
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, value: [f32; 3]) {
        self.data[y * self.width + x] = value;
    }

    /// Per-channel gradient at `(x, y)` from neighbors that already hold a
    /// value. `pending` is the pixel currently being filled and is never sampled.
    pub(crate) fn gradient(
        &self,
        front: &MarchingFront,
        x: usize,
        y: usize,
        pending: (usize, usize),
    ) -> [(f32, f32); 3] {
        let usable = |p: (usize, usize)| p != pending && front.is_settled(p.0, p.1);
        let left = x.checked_sub(1).map(|nx| (nx, y)).filter(|&p| usable(p));
        let right = (x + 1 < front.width()).then_some((x + 1, y)).filter(|&p| usable(p));
        let up = y.checked_sub(1).map(|ny| (x, ny)).filter(|&p| usable(p));
        let down = (y + 1 < front.height()).then_some((x, y + 1)).filter(|&p| usable(p));

        let center = self.get(x, y);
        let mut gradient = [(0.0, 0.0); 3];
        for (c, g) in gradient.iter_mut().enumerate() {
            let sample = |p: Option<(usize, usize)>| p.map(|(px, py)| self.get(px, py)[c]);
            g.0 = difference(center[c], sample(left), sample(right));
            g.1 = difference(center[c], sample(up), sample(down));
        }
        gradient
    }

    /// Write the filled values back to 8 bits. Unmasked pixels are copied from
    /// `source` untouched.
    pub(crate) fn into_image(self, source: &RgbImage, mask: &Mask) -> RgbImage {
        let mut output = source.clone();
        for (x, y, pixel) in output.enumerate_pixels_mut() {
            if mask.is_occluded(x, y) {
                let value = self.get(x as usize, y as usize);
                *pixel = Rgb(value.map(to_u8));
            }
        }
        output
    }
}

fn difference(center: f32, before: Option<f32>, after: Option<f32>) -> f32 {
    match (before, after) {
        (Some(b), Some(a)) => (a - b) * 0.5,
        (None, Some(a)) => a - center,
        (Some(b), None) => center - b,
        (None, None) => 0.0,
    }
}

pub(crate) fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// `radius` capped at the image diagonal. A larger window cannot reach any
/// further pixel, so the cap leaves the sampled neighborhood unchanged.
pub(crate) fn effective_radius(radius: u32, width: u32, height: u32) -> u32 {
    let diagonal_sq = u64::from(width).pow(2) + u64::from(height).pow(2);
    let diagonal = (diagonal_sq as f64).sqrt().ceil() as u32;
    radius.min(diagonal.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_radius_is_capped_by_diagonal() {
        assert_eq!(effective_radius(3, 100, 100), 3);
        assert_eq!(effective_radius(u32::MAX, 12, 12), 17);
        assert_eq!(effective_radius(u32::MAX, 3, 4), 5);
        assert_eq!(effective_radius(600_000_000, 1, 1), 2);
    }
}
