use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
};

use image::{
    DynamicImage, GrayImage, ImageBuffer, ImageFormat, Luma, Rgb32FImage, RgbImage,
    codecs::jpeg::JpegEncoder,
    imageops::{self, FilterType},
};
use tracing::debug;

use crate::{
    config::TargetSize,
    error::{ReconstructError, Result},
};

pub type GrayF32Image = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Anything that can be written as an artifact.
///
/// Float variants hold samples normalized to [0, 1]; they are converted with
/// `round(clamp(v, 0, 1) * 255)`.
#[derive(Debug, Clone)]
pub enum ImageData {
    Rgb(RgbImage),
    Gray(GrayImage),
    NormalizedRgb(Rgb32FImage),
    NormalizedGray(GrayF32Image),
}

impl ImageData {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Rgb(image) => image.dimensions(),
            Self::Gray(image) => image.dimensions(),
            Self::NormalizedRgb(image) => image.dimensions(),
            Self::NormalizedGray(image) => image.dimensions(),
        }
    }

    /// 8-bit view of the data.
    pub fn to_dynamic(&self) -> DynamicImage {
        match self {
            Self::Rgb(image) => DynamicImage::ImageRgb8(image.clone()),
            Self::Gray(image) => DynamicImage::ImageLuma8(image.clone()),
            Self::NormalizedRgb(image) => {
                let (width, height) = image.dimensions();
                let raw = image.as_raw().iter().map(|&v| normalized_to_u8(v)).collect();
                // Same length as the source buffer, so construction cannot fail.
                RgbImage::from_raw(width, height, raw)
                    .map(DynamicImage::ImageRgb8)
                    .unwrap_or_else(|| DynamicImage::new_rgb8(width, height))
            }
            Self::NormalizedGray(image) => {
                let (width, height) = image.dimensions();
                let raw = image.as_raw().iter().map(|&v| normalized_to_u8(v)).collect();
                GrayImage::from_raw(width, height, raw)
                    .map(DynamicImage::ImageLuma8)
                    .unwrap_or_else(|| DynamicImage::new_luma8(width, height))
            }
        }
    }
}

impl From<RgbImage> for ImageData {
    fn from(image: RgbImage) -> Self {
        Self::Rgb(image)
    }
}

impl From<GrayImage> for ImageData {
    fn from(image: GrayImage) -> Self {
        Self::Gray(image)
    }
}

impl From<Rgb32FImage> for ImageData {
    fn from(image: Rgb32FImage) -> Self {
        Self::NormalizedRgb(image)
    }
}

impl From<GrayF32Image> for ImageData {
    fn from(image: GrayF32Image) -> Self {
        Self::NormalizedGray(image)
    }
}

fn normalized_to_u8(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Load an image as RGB8, optionally resized with a Lanczos filter.
pub fn load_image<P: AsRef<Path>>(path: P, size: Option<TargetSize>) -> Result<RgbImage> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ReconstructError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let image = image::open(path)?.to_rgb8();
    match size {
        Some(TargetSize { width, height }) if (width, height) != image.dimensions() => {
            debug!(from = ?image.dimensions(), to = ?(width, height), "resizing input");
            Ok(imageops::resize(&image, width, height, FilterType::Lanczos3))
        }
        _ => Ok(image),
    }
}

/// Write `data` to `path`, creating parent directories. The encoder is picked
/// from the extension; `quality` applies to JPEG only.
pub fn save_image<P: AsRef<Path>>(data: &ImageData, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let format = ImageFormat::from_path(path)?;
    let image = data.to_dynamic();
    match format {
        ImageFormat::Jpeg => {
            let writer = BufWriter::new(File::create(path)?);
            let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
            image.write_with_encoder(encoder)?;
        }
        other => image.save_with_format(path, other)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_normalized_data_is_scaled_and_rounded() {
        let mut gray = GrayF32Image::new(4, 1);
        gray.put_pixel(0, 0, Luma([0.0]));
        gray.put_pixel(1, 0, Luma([0.5]));
        gray.put_pixel(2, 0, Luma([1.7]));
        gray.put_pixel(3, 0, Luma([-0.2]));

        let converted = ImageData::from(gray).to_dynamic().to_luma8();
        assert_eq!(converted.as_raw(), &vec![0, 128, 255, 0]);

        let rgb = Rgb32FImage::from_pixel(2, 2, Rgb([0.25, 1.0, 0.0]));
        let converted = ImageData::from(rgb).to_dynamic().to_rgb8();
        assert_eq!(converted.get_pixel(1, 1), &Rgb([64, 255, 0]));
    }

    #[test]
    fn test_save_and_load_png() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("nested/out/image.png");
        let image = RgbImage::from_fn(8, 6, |x, y| Rgb([(x * 30) as u8, (y * 40) as u8, 7]));

        save_image(&ImageData::from(image.clone()), &path, 95).expect("Should save");
        let loaded = load_image(&path, None).expect("Should load");
        assert_eq!(loaded, image);

        let resized = load_image(&path, Some(TargetSize::new(4, 3))).expect("Should load resized");
        assert_eq!(resized.dimensions(), (4, 3));
    }

    #[test]
    fn test_save_gray_jpeg() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("mask.jpg");
        let gray = GrayImage::from_pixel(16, 16, Luma([255]));

        save_image(&ImageData::from(gray), &path, 90).expect("Should save jpeg");
        let loaded = image::open(&path).expect("Should decode").to_luma8();
        assert_eq!(loaded.dimensions(), (16, 16));
        assert!(loaded.pixels().all(|p| p[0] > 250));
    }

    #[test]
    fn test_missing_and_corrupt_inputs() {
        let dir = tempfile::tempdir().expect("Should create temp dir");

        let err = load_image(dir.path().join("absent.png"), None).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);

        let corrupt = dir.path().join("corrupt.jpg");
        fs::write(&corrupt, b"definitely not a jpeg").expect("Should write file");
        let err = load_image(&corrupt, None).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::IoFailure);
    }
}
