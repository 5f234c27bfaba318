pub mod builder;

use image::RgbImage;
use tracing::debug;

use crate::{
    config::ReconstructConfig,
    error::Result,
    traits::{EdgeExtractor, InpaintEstimator, MaskExtractor},
    types::{EdgeMaps, Mask, Reconstruction},
};

/// Result of running the pipeline on one image.
#[derive(Debug, Clone)]
pub enum Outcome {
    Reconstructed(Reconstruction),
    /// The mask came out empty; no estimator was run.
    NothingToReconstruct { original: RgbImage, mask: Mask },
}

/// Image → mask → edges → blended reconstruction.
pub struct Pipeline {
    mask_extractor: Box<dyn MaskExtractor>,
    edge_extractor: Box<dyn EdgeExtractor>,
    inpainter: Box<dyn InpaintEstimator>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Create a new pipeline with the given components
    pub fn new(
        mask_extractor: Box<dyn MaskExtractor>,
        edge_extractor: Box<dyn EdgeExtractor>,
        inpainter: Box<dyn InpaintEstimator>,
    ) -> Self {
        Self {
            mask_extractor,
            edge_extractor,
            inpainter,
        }
    }

    /// Build the default stages from a validated configuration
    pub fn from_config(config: &ReconstructConfig) -> Result<Self> {
        config.validate()?;
        builder::PipelineBuilder::new()
            .with_threshold(config.mask_threshold()?)
            .with_edge_detection(config.edge_sigma, config.low_threshold, config.high_threshold)
            .with_dual_estimator(config.inpaint_radius, config.blend_weight)
            .map(builder::PipelineBuilder::build)
    }

    pub fn extract_mask(&self, image: &RgbImage) -> Result<Mask> {
        self.mask_extractor.extract_mask(image)
    }

    pub fn extract_edges(&self, image: &RgbImage, mask: &Mask) -> Result<EdgeMaps> {
        self.edge_extractor.extract_edges(image, mask)
    }

    pub fn inpaint(&self, image: &RgbImage, mask: &Mask) -> Result<RgbImage> {
        self.inpainter.inpaint(image, mask)
    }

    /// Process an image through the entire pipeline
    pub fn process(&self, image: &RgbImage) -> Result<Outcome> {
        // Step 1: Occlusion mask
        let mask = self.extract_mask(image)?;
        if mask.is_empty() {
            return Ok(Outcome::NothingToReconstruct {
                original: image.clone(),
                mask,
            });
        }
        debug!(occluded = mask.occluded_count(), "mask extracted");

        // Step 2: Structural edges. They are reported but do not steer the fill.
        let edges = self.extract_edges(image, &mask)?;

        // Step 3: Fill the hole
        let result = self.inpaint(image, &mask)?;

        Ok(Outcome::Reconstructed(Reconstruction {
            original: image.clone(),
            mask,
            edges,
            result,
        }))
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!("Pipeline: threshold mask → canny edges → {} inpainting", self.inpainter.name())
    }
}
