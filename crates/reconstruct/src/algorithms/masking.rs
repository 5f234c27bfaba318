use image::RgbImage;
use crate::{error::Result, traits::MaskExtractor, types::Mask};
use super::preprocessing::{close_square, luminance, open_square};

/// Marks near-white pixels as occluded, then cleans the result with a
/// closing followed by an opening.
#[derive(Debug, Clone)]
pub struct ThresholdMaskExtractor {
    pub threshold: u8,
}

impl Default for ThresholdMaskExtractor {
    fn default() -> Self {
        Self { threshold: 240 }
    }
}

impl MaskExtractor for ThresholdMaskExtractor {
    fn extract_mask(&self, image: &RgbImage) -> Result<Mask> {
        Ok(extract_mask(image, self.threshold))
    }
}

/// Pixels whose luminance is strictly above `threshold` become occluded.
pub fn extract_mask(image: &RgbImage, threshold: u8) -> Mask {
    let gray = luminance(image);
    let binary = imageproc::contrast::threshold(&gray, threshold);
    // Close first so small holes are filled before specks are removed.
    let cleaned = open_square(&close_square(&binary));
    Mask::from_binary(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gray_with_white_square(size: u32, x0: u32, y0: u32, side: u32) -> RgbImage {
        let mut image = RgbImage::from_pixel(size, size, Rgb([128, 128, 128]));
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                image.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        image
    }

    #[test]
    fn test_square_is_reproduced() {
        let image = gray_with_white_square(64, 20, 24, 20);
        let mask = extract_mask(&image, 240);

        assert_eq!(mask.dimensions(), (64, 64));
        assert_eq!(mask, Mask::from_rect(64, 64, 20, 24, 20, 20));
    }

    #[test]
    fn test_threshold_extremes() {
        let image = gray_with_white_square(32, 8, 8, 10);

        let none = extract_mask(&image, 255);
        assert!(none.is_empty());

        let all = extract_mask(&image, 0);
        assert_eq!(all.occluded_count(), 32 * 32);
    }

    #[test]
    fn test_threshold_monotonicity() {
        let mut image = RgbImage::new(40, 40);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let v = ((x * 7 + y * 13) % 256) as u8;
            *pixel = Rgb([v, v.wrapping_add(40), 255 - v]);
        }

        let mut previous = usize::MAX;
        for threshold in (0..=255u16).step_by(15) {
            let count = extract_mask(&image, threshold as u8).occluded_count();
            assert!(count <= previous, "threshold {threshold}: {count} > {previous}");
            previous = count;
        }
    }

    #[test]
    fn test_isolated_specks_are_removed() {
        let mut image = RgbImage::from_pixel(30, 30, Rgb([90, 90, 90]));
        image.put_pixel(5, 5, Rgb([255, 255, 255]));
        image.put_pixel(20, 7, Rgb([250, 250, 250]));

        let mask = ThresholdMaskExtractor::default()
            .extract_mask(&image)
            .expect("Should extract mask");
        assert!(mask.is_empty());
    }

    #[test]
    fn test_pinhole_inside_patch_is_filled() {
        let mut image = gray_with_white_square(30, 10, 10, 8);
        image.put_pixel(13, 13, Rgb([100, 100, 100]));

        let mask = extract_mask(&image, 240);
        assert!(mask.is_occluded(13, 13));
        assert_eq!(mask.occluded_count(), 64);
    }
}
