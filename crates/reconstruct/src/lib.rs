//! # Face Reconstruction Library
//!
//! Fills near-white occlusions in face images. A mask of the occluded region
//! is extracted by thresholding, structural edges around it are computed, and
//! the hole is reconstructed by blending two inpainting estimators.
//!
//! ## Core Features
//!
//! - **Trait-based Stages**: `MaskExtractor`, `EdgeExtractor` and `InpaintEstimator`
//!   can each be swapped for custom implementations
//! - **Pipeline System**: Compose the stages with a fluent builder
//! - **Dual Estimator**: Telea fast marching blended with a Navier-Stokes style fill
//! - **Batch Processing**: Reconstruct a directory, collecting per-file failures
//! - **Configuration**: TOML/JSON files with a published JSON schema
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reconstruct::{FaceReconstructor, ReconstructConfig};
//! use std::path::Path;
//!
//! let reconstructor = FaceReconstructor::new(ReconstructConfig::default())?;
//! let result = reconstructor.process_image(Path::new("face.jpg"), Path::new("output"))?;
//! println!("filled {} pixels", result.mask.occluded_count());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use reconstruct::{Pipeline, Outcome, TeleaEstimator};
//!
//! let pipeline = Pipeline::builder()
//!     .with_threshold(230)
//!     .set_inpainter(TeleaEstimator::new(5))
//!     .build();
//!
//! let image = image::open("face.png")?.to_rgb8();
//! if let Outcome::Reconstructed(reconstruction) = pipeline.process(&image)? {
//!     reconstruction.result.save("filled.png")?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod algorithms;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod reconstructor;
pub mod traits;
pub mod types;

pub use algorithms::*;
pub use config::{OutputFormat, ReconstructConfig, TargetSize};
pub use error::{ErrorKind, ReconstructError, Result};
pub use io::*;
pub use pipeline::{Outcome, Pipeline, builder::PipelineBuilder};
pub use reconstructor::{BatchFailure, BatchReport, FaceReconstructor, create_sample_image};
pub use traits::*;
pub use types::{EdgeMaps, Mask, Reconstruction};
