//! Run configuration.
//!
//! A [`ReconstructConfig`] is built once per run and treated as read-only
//! afterwards. Changes go through the `with_*` builders, which return a new
//! record instead of mutating a shared one.

use std::{fs, path::Path};

use image::ImageFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::{ReconstructError, Result};

pub const DEFAULT_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".bmp"];

/// Resize target applied right after loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Encoding used for every written artifact.
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputFormat {
    #[default]
    Jpg,
    Png,
    Bmp,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        self.into()
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Bmp => ImageFormat::Bmp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ReconstructConfig {
    /// Luminance above which a pixel counts as occluded (0-255)
    #[schemars(range(min = 0, max = 255))]
    pub threshold: i32,
    /// Gaussian sigma applied before edge detection
    pub edge_sigma: f32,
    /// Low hysteresis threshold, as a fraction of 255
    #[schemars(range(min = 0.0, max = 1.0))]
    pub low_threshold: f32,
    /// High hysteresis threshold, as a fraction of 255
    #[schemars(range(min = 0.0, max = 1.0))]
    pub high_threshold: f32,
    /// Neighborhood radius of both inpainting estimators, in pixels
    #[schemars(range(min = 1))]
    pub inpaint_radius: u32,
    /// Share of the diffusion estimator in the final blend
    #[schemars(range(min = 0.0, max = 1.0))]
    pub blend_weight: f32,
    /// Resize inputs to this size before processing
    pub target_size: Option<TargetSize>,
    /// Write mask, edge, result and comparison artifacts
    pub save_intermediate: bool,
    pub output_format: OutputFormat,
    /// JPEG quality (1-100)
    #[schemars(range(min = 1, max = 100))]
    pub output_quality: u8,
    /// File extensions picked up by batch processing
    pub extensions: Vec<String>,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            threshold: 240,
            edge_sigma: 2.0,
            low_threshold: 0.1,
            high_threshold: 0.2,
            inpaint_radius: 3,
            blend_weight: 0.3,
            target_size: None,
            save_intermediate: true,
            output_format: OutputFormat::Jpg,
            output_quality: 95,
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

impl ReconstructConfig {
    pub fn with_threshold(self, threshold: i32) -> Self {
        Self { threshold, ..self }
    }

    pub fn with_edge_sigma(self, edge_sigma: f32) -> Self {
        Self { edge_sigma, ..self }
    }

    pub fn with_hysteresis(self, low_threshold: f32, high_threshold: f32) -> Self {
        Self {
            low_threshold,
            high_threshold,
            ..self
        }
    }

    pub fn with_inpaint_radius(self, inpaint_radius: u32) -> Self {
        Self {
            inpaint_radius,
            ..self
        }
    }

    pub fn with_blend_weight(self, blend_weight: f32) -> Self {
        Self { blend_weight, ..self }
    }

    pub fn with_target_size(self, target_size: Option<TargetSize>) -> Self {
        Self { target_size, ..self }
    }

    pub fn with_save_intermediate(self, save_intermediate: bool) -> Self {
        Self {
            save_intermediate,
            ..self
        }
    }

    pub fn with_output_format(self, output_format: OutputFormat) -> Self {
        Self {
            output_format,
            ..self
        }
    }

    pub fn with_output_quality(self, output_quality: u8) -> Self {
        Self {
            output_quality,
            ..self
        }
    }

    pub fn with_extensions<I, S>(self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    /// The mask threshold as an 8-bit value.
    pub fn mask_threshold(&self) -> Result<u8> {
        u8::try_from(self.threshold)
            .map_err(|_| ReconstructError::invalid("threshold", self.threshold, "must be within 0-255"))
    }

    /// Check every field against its documented range.
    pub fn validate(&self) -> Result<()> {
        self.mask_threshold()?;

        if !self.edge_sigma.is_finite() || self.edge_sigma <= 0.0 {
            return Err(ReconstructError::invalid("edge_sigma", self.edge_sigma, "must be a positive number"));
        }
        validate_hysteresis(self.low_threshold, self.high_threshold)?;
        if self.inpaint_radius == 0 {
            return Err(ReconstructError::invalid("inpaint_radius", self.inpaint_radius, "must be positive"));
        }
        validate_blend_weight(self.blend_weight)?;
        if let Some(size) = self.target_size {
            if size.width == 0 || size.height == 0 {
                return Err(ReconstructError::invalid(
                    "target_size",
                    format!("{}x{}", size.width, size.height),
                    "both dimensions must be positive",
                ));
            }
        }
        if !(1..=100).contains(&self.output_quality) {
            return Err(ReconstructError::invalid("output_quality", self.output_quality, "must be within 1-100"));
        }
        if self.extensions.is_empty() {
            return Err(ReconstructError::invalid("extensions", "[]", "at least one extension is required"));
        }
        Ok(())
    }

    /// Get the JSON schema of the configuration file
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReconstructConfig)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string. Missing fields take their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path_ref),
            Some("json") => Self::from_json_file(path_ref),
            _ => Err(ReconstructError::UnsupportedConfigFormat {
                path: path_ref.to_path_buf(),
            }),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub(crate) fn validate_hysteresis(low: f32, high: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&low) {
        return Err(ReconstructError::invalid("low_threshold", low, "must be within [0, 1]"));
    }
    if !(0.0..=1.0).contains(&high) {
        return Err(ReconstructError::invalid("high_threshold", high, "must be within [0, 1]"));
    }
    if high < low {
        return Err(ReconstructError::invalid(
            "high_threshold",
            high,
            "must not be lower than low_threshold",
        ));
    }
    Ok(())
}

pub(crate) fn validate_blend_weight(weight: f32) -> Result<()> {
    if (0.0..=1.0).contains(&weight) {
        Ok(())
    } else {
        Err(ReconstructError::invalid("blend_weight", weight, "must be within [0, 1]"))
    }
}

fn read_config(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ReconstructError::NotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_defaults_are_valid() {
        let config = ReconstructConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mask_threshold().unwrap(), 240);
        assert_eq!(config.extensions.len(), 4);
        assert_eq!(config.output_format.extension(), "jpg");
    }

    #[test]
    fn test_functional_update_leaves_original_untouched() {
        let base = ReconstructConfig::default();
        let updated = base.clone().with_threshold(200).with_blend_weight(0.5);

        assert_eq!(base.threshold, 240);
        assert_eq!(updated.threshold, 200);
        assert_eq!(updated.blend_weight, 0.5);
        assert_eq!(updated.inpaint_radius, base.inpaint_radius);
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let cases = [
            ReconstructConfig::default().with_threshold(256),
            ReconstructConfig::default().with_threshold(-1),
            ReconstructConfig::default().with_blend_weight(1.2),
            ReconstructConfig::default().with_blend_weight(f32::NAN),
            ReconstructConfig::default().with_hysteresis(0.3, 0.2),
            ReconstructConfig::default().with_inpaint_radius(0),
            ReconstructConfig::default().with_edge_sigma(0.0),
            ReconstructConfig::default().with_target_size(Some(TargetSize::new(0, 10))),
            ReconstructConfig::default().with_output_quality(0),
            ReconstructConfig::default().with_extensions(Vec::<String>::new()),
        ];

        for config in cases {
            let err = config.validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{config:?}");
        }
    }

    #[test]
    fn test_threshold_error_reports_value() {
        let err = ReconstructConfig::default().with_threshold(300).validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("threshold"));
        assert!(message.contains("300"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ReconstructConfig::from_toml(
            r#"
            threshold = 230
            output_format = "png"

            [target_size]
            width = 256
            height = 128
            "#,
        )
        .expect("Should parse partial config");

        assert_eq!(config.threshold, 230);
        assert_eq!(config.output_format, OutputFormat::Png);
        assert_eq!(config.target_size, Some(TargetSize::new(256, 128)));
        assert_eq!(config.inpaint_radius, 3);
        assert_eq!(config.blend_weight, 0.3);
    }

    #[test]
    fn test_unknown_config_extension() {
        let err = ReconstructConfig::from_file("settings.yaml").unwrap_err();
        assert!(matches!(err, ReconstructError::UnsupportedConfigFormat { .. }));
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("PNG".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::Bmp.image_format(), ImageFormat::Bmp);
    }

    fn customised() -> ReconstructConfig {
        ReconstructConfig::default()
            .with_threshold(225)
            .with_blend_weight(0.45)
            .with_target_size(Some(TargetSize::new(320, 240)))
            .with_output_format(OutputFormat::Bmp)
            .with_extensions([".png", ".tif"])
    }

    #[test]
    fn test_toml_file_round_trip_with_target_size() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("config.toml");
        let config = customised();

        let toml = config.to_toml().expect("Should serialize TOML");
        assert!(toml.contains("[target_size]"));
        fs::write(&path, toml).expect("Should write config");

        let loaded = ReconstructConfig::from_file(&path).expect("Should load TOML");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("config.json");
        let config = customised();

        fs::write(&path, config.to_json().expect("Should serialize JSON")).expect("Should write config");
        let loaded = ReconstructConfig::from_file(&path).expect("Should load JSON");
        assert_eq!(loaded, config);

        let partial = ReconstructConfig::from_json(r#"{ "inpaint_radius": 5, "output_format": "png" }"#)
            .expect("Should parse partial JSON");
        assert_eq!(partial.inpaint_radius, 5);
        assert_eq!(partial.output_format, OutputFormat::Png);
        assert_eq!(partial.threshold, 240);

        let err = ReconstructConfig::from_json_file(dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = ReconstructConfig::from_json("{ not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }
}
