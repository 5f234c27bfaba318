use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;

/// Convert RGB to luminance with the BT.601 weights (0.299, 0.587, 0.114).
///
/// Fixed-point coefficients sum to `1 << 14`, so white stays 255 and any
/// neutral gray maps to itself.
pub fn luminance(image: &RgbImage) -> GrayImage {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    const SHIFT: u32 = 14;

    let mut gray = GrayImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(gray.pixels_mut()) {
        let [r, g, b] = src.0;
        let y = (u32::from(r) * R + u32::from(g) * G + u32::from(b) * B + (1 << (SHIFT - 1))) >> SHIFT;
        *dst = Luma([y as u8]);
    }
    gray
}

/// Closing (dilate then erode) with a 3x3 square element.
pub fn close_square(image: &GrayImage) -> GrayImage {
    imageproc::morphology::close(image, Norm::LInf, 1)
}

/// Opening (erode then dilate) with a 3x3 square element.
pub fn open_square(image: &GrayImage) -> GrayImage {
    imageproc::morphology::open(image, Norm::LInf, 1)
}

/// Dilation with a 3x3 square element repeated `iterations` times.
///
/// Repeating a 3x3 dilation `n` times equals one dilation with a
/// `(2n+1)x(2n+1)` square, which is what the L-infinity ball of radius `n` is.
pub fn dilate_square(image: &GrayImage, iterations: u8) -> GrayImage {
    if iterations == 0 {
        return image.clone();
    }
    imageproc::morphology::dilate(image, Norm::LInf, iterations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_luminance_weights() {
        let mut image = RgbImage::new(4, 1);
        image.put_pixel(0, 0, Rgb([255, 255, 255]));
        image.put_pixel(1, 0, Rgb([128, 128, 128]));
        image.put_pixel(2, 0, Rgb([255, 0, 0]));
        image.put_pixel(3, 0, Rgb([0, 0, 255]));
        let gray = luminance(&image);

        assert_eq!(gray.get_pixel(0, 0)[0], 255);
        assert_eq!(gray.get_pixel(1, 0)[0], 128);
        assert_eq!(gray.get_pixel(2, 0)[0], 76);
        assert_eq!(gray.get_pixel(3, 0)[0], 29);
    }

    #[test]
    fn test_dilation_is_square() {
        let mut image = GrayImage::new(9, 9);
        image.put_pixel(4, 4, Luma([255]));

        let grown = dilate_square(&image, 2);
        let count = grown.pixels().filter(|p| p[0] == 255).count();
        assert_eq!(count, 25);
        assert_eq!(grown.get_pixel(2, 2)[0], 255);
        assert_eq!(grown.get_pixel(1, 4)[0], 0);
    }

    #[test]
    fn test_close_fills_single_pixel_hole() {
        let mut image = GrayImage::from_pixel(7, 7, Luma([0]));
        for y in 1..6 {
            for x in 1..6 {
                image.put_pixel(x, y, Luma([255]));
            }
        }
        image.put_pixel(3, 3, Luma([0]));

        let closed = close_square(&image);
        assert_eq!(closed.get_pixel(3, 3)[0], 255);
    }

    #[test]
    fn test_open_removes_speck() {
        let mut image = GrayImage::new(7, 7);
        image.put_pixel(3, 3, Luma([255]));

        let opened = open_square(&image);
        assert!(opened.pixels().all(|p| p[0] == 0));
    }
}
