use crate::{
    algorithms::{CannyEdgeExtractor, DualEstimatorBlender, ThresholdMaskExtractor},
    error::Result,
    pipeline::Pipeline,
    traits::{EdgeExtractor, InpaintEstimator, MaskExtractor},
};

/// Builder for creating processing pipelines with a fluent API
pub struct PipelineBuilder {
    mask_extractor: Option<Box<dyn MaskExtractor>>,
    edge_extractor: Option<Box<dyn EdgeExtractor>>,
    inpainter: Option<Box<dyn InpaintEstimator>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            mask_extractor: None,
            edge_extractor: None,
            inpainter: None,
        }
    }

    /// Set the mask extractor (replaces any existing one)
    pub fn set_mask_extractor<M>(mut self, extractor: M) -> Self
    where
        M: MaskExtractor + 'static,
    {
        self.mask_extractor = Some(Box::new(extractor));
        self
    }

    /// Set the edge extractor (replaces any existing one)
    pub fn set_edge_extractor<E>(mut self, extractor: E) -> Self
    where
        E: EdgeExtractor + 'static,
    {
        self.edge_extractor = Some(Box::new(extractor));
        self
    }

    /// Set the inpainting estimator (replaces any existing one)
    pub fn set_inpainter<I>(mut self, inpainter: I) -> Self
    where
        I: InpaintEstimator + 'static,
    {
        self.inpainter = Some(Box::new(inpainter));
        self
    }

    /// Use near-white thresholding at `threshold`
    pub fn with_threshold(self, threshold: u8) -> Self {
        self.set_mask_extractor(ThresholdMaskExtractor { threshold })
    }

    /// Use Canny edges with the given smoothing and hysteresis fractions
    pub fn with_edge_detection(self, sigma: f32, low: f32, high: f32) -> Self {
        self.set_edge_extractor(CannyEdgeExtractor {
            sigma,
            low,
            high,
            ..CannyEdgeExtractor::default()
        })
    }

    /// Blend Telea and Navier-Stokes estimates; fails on a weight outside [0, 1]
    pub fn with_dual_estimator(self, radius: u32, weight: f32) -> Result<Self> {
        Ok(self.set_inpainter(DualEstimatorBlender::with_radius(radius, weight)?))
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> Pipeline {
        let mask_extractor = self
            .mask_extractor
            .unwrap_or_else(|| Box::new(ThresholdMaskExtractor::default()));

        let edge_extractor = self
            .edge_extractor
            .unwrap_or_else(|| Box::new(CannyEdgeExtractor::default()));

        let inpainter = self
            .inpainter
            .unwrap_or_else(|| Box::new(DualEstimatorBlender::default()));

        Pipeline::new(mask_extractor, edge_extractor, inpainter)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
