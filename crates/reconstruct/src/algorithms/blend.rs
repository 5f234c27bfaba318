use image::{Rgb, RgbImage};
use tracing::debug;

use crate::{
    config::validate_blend_weight,
    error::Result,
    traits::InpaintEstimator,
    types::{Mask, check_dimensions},
};
use super::{canvas::to_u8, navier_stokes::NavierStokesEstimator, telea::TeleaEstimator};

/// Runs two estimators over the same hole and mixes them linearly:
/// `(1 - weight) * primary + weight * secondary`.
pub struct DualEstimatorBlender {
    primary: Box<dyn InpaintEstimator>,
    secondary: Box<dyn InpaintEstimator>,
    weight: f32,
}

impl DualEstimatorBlender {
    pub fn new<P, S>(primary: P, secondary: S, weight: f32) -> Result<Self>
    where
        P: InpaintEstimator + 'static,
        S: InpaintEstimator + 'static,
    {
        validate_blend_weight(weight)?;
        Ok(Self {
            primary: Box::new(primary),
            secondary: Box::new(secondary),
            weight,
        })
    }

    /// Telea as the primary estimator, Navier-Stokes as the secondary.
    pub fn with_radius(radius: u32, weight: f32) -> Result<Self> {
        Self::new(TeleaEstimator::new(radius), NavierStokesEstimator::new(radius), weight)
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }
}

impl Default for DualEstimatorBlender {
    fn default() -> Self {
        Self {
            primary: Box::new(TeleaEstimator::default()),
            secondary: Box::new(NavierStokesEstimator::default()),
            weight: 0.3,
        }
    }
}

impl std::fmt::Debug for DualEstimatorBlender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualEstimatorBlender")
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary.name())
            .field("weight", &self.weight)
            .finish()
    }
}

impl InpaintEstimator for DualEstimatorBlender {
    fn name(&self) -> &'static str {
        "dual_blend"
    }

    fn inpaint(&self, image: &RgbImage, mask: &Mask) -> Result<RgbImage> {
        mask.ensure_dimensions(image.dimensions())?;
        if mask.is_empty() {
            debug!("mask has no occluded pixels, returning input unchanged");
            return Ok(image.clone());
        }

        let primary = self.primary.inpaint(image, mask)?;
        let secondary = self.secondary.inpaint(image, mask)?;
        debug!(
            primary = self.primary.name(),
            secondary = self.secondary.name(),
            weight = self.weight,
            "blending estimates"
        );
        blend_estimates(image, mask, &primary, &secondary, self.weight)
    }
}

/// Mix two estimates inside the mask; everything outside is copied from `source`.
pub fn blend_estimates(
    source: &RgbImage,
    mask: &Mask,
    primary: &RgbImage,
    secondary: &RgbImage,
    weight: f32,
) -> Result<RgbImage> {
    validate_blend_weight(weight)?;
    mask.ensure_dimensions(source.dimensions())?;
    check_dimensions("primary estimate", source.dimensions(), primary.dimensions())?;
    check_dimensions("secondary estimate", source.dimensions(), secondary.dimensions())?;

    let mut output = source.clone();
    for (x, y, pixel) in output.enumerate_pixels_mut() {
        if !mask.is_occluded(x, y) {
            continue;
        }
        let a = primary.get_pixel(x, y);
        let b = secondary.get_pixel(x, y);
        *pixel = Rgb([0, 1, 2].map(|c| {
            to_u8((1.0 - weight) * f32::from(a[c]) + weight * f32::from(b[c]))
        }));
    }
    Ok(output)
}

/// Reconstruct the masked region with the default Telea/Navier-Stokes pair.
pub fn inpaint(image: &RgbImage, mask: &Mask, radius: u32, blend_weight: f32) -> Result<RgbImage> {
    DualEstimatorBlender::with_radius(radius, blend_weight)?.inpaint(image, mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textured(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (100.0 + 60.0 * (x as f32 / 5.0).sin()) as u8,
                (90 + (y * 3) % 80) as u8,
                ((x * y) % 200) as u8,
            ])
        })
    }

    fn painted(image: &RgbImage, mask: &Mask) -> RgbImage {
        let mut painted = image.clone();
        for (x, y, pixel) in painted.enumerate_pixels_mut() {
            if mask.is_occluded(x, y) {
                *pixel = Rgb([255, 255, 255]);
            }
        }
        painted
    }

    #[test]
    fn test_weight_zero_is_primary_and_one_is_secondary() {
        let mask = Mask::from_rect(36, 30, 12, 8, 10, 9);
        let image = painted(&textured(36, 30), &mask);

        let telea = TeleaEstimator::new(3).inpaint(&image, &mask).expect("Should inpaint");
        let navier = NavierStokesEstimator::new(3).inpaint(&image, &mask).expect("Should inpaint");

        assert_eq!(inpaint(&image, &mask, 3, 0.0).expect("Should blend"), telea);
        assert_eq!(inpaint(&image, &mask, 3, 1.0).expect("Should blend"), navier);
    }

    #[test]
    fn test_blend_lies_between_estimates() {
        let mask = Mask::from_rect(36, 30, 12, 8, 10, 9);
        let image = painted(&textured(36, 30), &mask);
        let telea = TeleaEstimator::new(3).inpaint(&image, &mask).expect("Should inpaint");
        let navier = NavierStokesEstimator::new(3).inpaint(&image, &mask).expect("Should inpaint");

        let blended = inpaint(&image, &mask, 3, 0.3).expect("Should blend");
        for (x, y, pixel) in blended.enumerate_pixels() {
            for c in 0..3 {
                let (a, b) = (telea.get_pixel(x, y)[c], navier.get_pixel(x, y)[c]);
                assert!(pixel[c] >= a.min(b) && pixel[c] <= a.max(b), "({x}, {y}) channel {c}");
            }
        }
    }

    #[test]
    fn test_unmasked_pixels_pass_through_exactly() {
        let source = textured(30, 30);
        let mask = Mask::from_rect(30, 30, 8, 8, 12, 6);
        let image = painted(&source, &mask);

        let result = inpaint(&image, &mask, 3, 0.3).expect("Should blend");
        for (x, y, pixel) in result.enumerate_pixels() {
            if !mask.is_occluded(x, y) {
                assert_eq!(pixel, source.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_empty_mask_returns_input() {
        let image = textured(20, 20);
        let result = inpaint(&image, &Mask::empty(20, 20), 3, 0.3).expect("Should pass through");
        assert_eq!(result, image);
    }

    #[test]
    fn test_invalid_weight_and_dimensions() {
        let image = textured(20, 20);
        let mask = Mask::from_rect(20, 20, 5, 5, 4, 4);

        assert!(inpaint(&image, &mask, 3, 1.01).is_err());
        assert!(inpaint(&image, &mask, 3, -0.1).is_err());
        assert!(inpaint(&image, &Mask::from_rect(10, 20, 2, 2, 3, 3), 3, 0.3).is_err());
    }
}
