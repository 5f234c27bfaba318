use image::RgbImage;
use crate::{error::Result, types::{EdgeMaps, Mask}};

/// Trait for occlusion mask extraction algorithms
pub trait MaskExtractor: Send + Sync {
    /// Derive the binary occlusion mask of an RGB image
    fn extract_mask(&self, image: &RgbImage) -> Result<Mask>;
}

/// Trait for structural edge extraction algorithms
pub trait EdgeExtractor: Send + Sync {
    /// Detect edges and clear/grow them around the occluded region
    fn extract_edges(&self, image: &RgbImage, mask: &Mask) -> Result<EdgeMaps>;
}

/// Trait for region-filling estimators
pub trait InpaintEstimator: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Fill every occluded pixel. Pixels outside the mask must be returned unchanged.
    fn inpaint(&self, image: &RgbImage, mask: &Mask) -> Result<RgbImage>;
}
