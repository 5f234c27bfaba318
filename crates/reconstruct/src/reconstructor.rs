use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_circle_mut, draw_filled_ellipse_mut, draw_line_segment_mut, draw_polygon_mut},
    point::Point,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    config::ReconstructConfig,
    error::{ErrorKind, ReconstructError, Result},
    io::{ArtifactPaths, ImageData, base_name, list_images, load_image, save_image},
    pipeline::{Outcome, Pipeline},
    types::Reconstruction,
};

/// A batch input that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub processed: Vec<PathBuf>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.processed.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Loads images, runs the pipeline and writes the artifacts.
pub struct FaceReconstructor {
    config: ReconstructConfig,
    pipeline: Pipeline,
}

impl FaceReconstructor {
    pub fn new(config: ReconstructConfig) -> Result<Self> {
        let pipeline = Pipeline::from_config(&config)?;
        Ok(Self { config, pipeline })
    }

    pub fn config(&self) -> &ReconstructConfig {
        &self.config
    }

    /// Replace the configuration, rebuilding the pipeline stages.
    pub fn with_config(self, config: ReconstructConfig) -> Result<Self> {
        Self::new(config)
    }

    /// Run the pipeline on an image already in memory. Nothing is written.
    pub fn process_loaded(&self, image: &RgbImage) -> Result<Reconstruction> {
        match self.pipeline.process(image)? {
            Outcome::Reconstructed(reconstruction) => Ok(reconstruction),
            Outcome::NothingToReconstruct { .. } => Err(self.empty_mask_error()),
        }
    }

    /// Reconstruct one file. Artifacts land in `output_dir` when
    /// `save_intermediate` is set; an empty mask still writes the mask before
    /// failing.
    pub fn process_image(&self, path: &Path, output_dir: &Path) -> Result<Reconstruction> {
        let paths = ArtifactPaths::for_input(output_dir, path, self.config.output_format)?;
        let image = load_image(path, self.config.target_size)?;
        debug!(path = %path.display(), dimensions = ?image.dimensions(), "loaded input");

        match self.pipeline.process(&image)? {
            Outcome::Reconstructed(reconstruction) => {
                if self.config.save_intermediate {
                    self.save_artifacts(&reconstruction, &paths)?;
                }
                info!(
                    path = %path.display(),
                    occluded = reconstruction.mask.occluded_count(),
                    "reconstructed"
                );
                Ok(reconstruction)
            }
            Outcome::NothingToReconstruct { mask, .. } => {
                if self.config.save_intermediate {
                    self.save(ImageData::Gray(mask.into_image()), &paths.mask)?;
                }
                warn!(path = %path.display(), threshold = self.config.threshold, "no occlusion found");
                Err(self.empty_mask_error())
            }
        }
    }

    /// Reconstruct every matching image directly inside `input_dir`.
    ///
    /// Per-image failures are logged and collected in the report; only a
    /// missing input directory or an unusable output directory fails the call.
    pub fn batch_process(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchReport> {
        let inputs = list_images(input_dir, &self.config.extensions)?;
        if self.config.save_intermediate {
            fs::create_dir_all(output_dir)?;
        }
        info!(count = inputs.len(), input = %input_dir.display(), "starting batch");

        let mut report = BatchReport::default();
        let mut claimed: HashMap<String, PathBuf> = HashMap::new();

        for path in inputs {
            let outcome = self.claim_output(&mut claimed, &path).and_then(|()| self.process_image(&path, output_dir));
            match outcome {
                Ok(_) => report.processed.push(path),
                Err(err) => {
                    warn!(path = %path.display(), kind = %err.kind(), "{err}");
                    report.failures.push(BatchFailure {
                        path,
                        kind: err.kind(),
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            processed = report.processed.len(),
            failed = report.failures.len(),
            "batch complete"
        );
        Ok(report)
    }

    fn claim_output(&self, claimed: &mut HashMap<String, PathBuf>, path: &Path) -> Result<()> {
        let base = base_name(path)?;
        if let Some(first) = claimed.get(&base) {
            return Err(ReconstructError::OutputCollision {
                base,
                first: first.clone(),
                second: path.to_path_buf(),
            });
        }
        claimed.insert(base, path.to_path_buf());
        Ok(())
    }

    fn save_artifacts(&self, reconstruction: &Reconstruction, paths: &ArtifactPaths) -> Result<()> {
        self.save(ImageData::Rgb(reconstruction.result.clone()), &paths.reconstructed)?;
        self.save(ImageData::Gray(reconstruction.mask.as_image().clone()), &paths.mask)?;
        self.save(ImageData::Gray(reconstruction.edges.edges.clone()), &paths.edges)?;
        self.save(ImageData::Rgb(reconstruction.comparison()), &paths.comparison)
    }

    fn save(&self, data: ImageData, path: &Path) -> Result<()> {
        save_image(&data, path, self.config.output_quality)?;
        debug!(path = %path.display(), "saved");
        Ok(())
    }

    fn empty_mask_error(&self) -> ReconstructError {
        // The config was validated when the pipeline was built.
        let threshold = self.config.threshold.clamp(0, 255) as u8;
        ReconstructError::EmptyMask { threshold }
    }
}

impl Default for FaceReconstructor {
    fn default() -> Self {
        Self {
            config: ReconstructConfig::default(),
            pipeline: Pipeline::builder().build(),
        }
    }
}

/// Draw a synthetic face with a white occlusion over the nose and save it.
pub fn create_sample_image(size: u32, path: &Path) -> Result<RgbImage> {
    let mut image = RgbImage::from_pixel(size, size, Rgb([200, 200, 200]));
    let (cx, cy) = ((size / 2) as i32, (size / 2) as i32);

    draw_filled_ellipse_mut(&mut image, (cx, cy), 80, 100, Rgb([180, 150, 120]));

    let eye = Rgb([50, 50, 50]);
    draw_filled_circle_mut(&mut image, (cx - 25, cy - 20), 8, eye);
    draw_filled_circle_mut(&mut image, (cx + 25, cy - 20), 8, eye);

    // Smile: lower half of the ellipse outline, two pixels thick.
    let mouth = Rgb([100, 50, 50]);
    draw_lower_arc(&mut image, (cx, cy + 30), (15.0, 8.0), mouth);
    draw_lower_arc(&mut image, (cx, cy + 30), (14.0, 7.0), mouth);

    let nose = [
        Point::new(cx - 10, cy - 5),
        Point::new(cx + 10, cy - 5),
        Point::new(cx + 8, cy + 15),
        Point::new(cx - 8, cy + 15),
    ];
    draw_polygon_mut(&mut image, &nose, Rgb([255, 255, 255]));

    save_image(&ImageData::Rgb(image.clone()), path, 95)?;
    info!(path = %path.display(), size, "sample image created");
    Ok(image)
}

fn draw_lower_arc(image: &mut RgbImage, center: (i32, i32), radii: (f32, f32), color: Rgb<u8>) {
    const STEPS: u32 = 36;
    let (cx, cy) = (center.0 as f32, center.1 as f32);
    let point = |step: u32| {
        let angle = std::f32::consts::PI * step as f32 / STEPS as f32;
        (cx + radii.0 * angle.cos(), cy + radii.1 * angle.sin())
    };
    for step in 0..STEPS {
        draw_line_segment_mut(image, point(step), point(step + 1), color);
    }
}
