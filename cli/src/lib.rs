use std::fs;
use std::path::Path;

use reconstruct::{BatchReport, ReconstructConfig, ReconstructError, TargetSize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Reconstruct(#[from] ReconstructError),
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("--size expects WIDTH HEIGHT, got {0} value(s)")]
    InvalidSize(usize),
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub threshold: Option<i32>,
    pub size: Option<TargetSize>,
    pub extensions: Option<Vec<String>>,
}

impl ConfigOverrides {
    pub fn with_threshold(mut self, threshold: Option<i32>) -> Self {
        self.threshold = threshold;
        self
    }

    /// `--size WIDTH HEIGHT`, as collected by clap.
    pub fn with_size(mut self, size: Option<&[u32]>) -> Result<Self, CliError> {
        self.size = match size {
            None => None,
            Some(&[width, height]) => Some(TargetSize::new(width, height)),
            Some(values) => return Err(CliError::InvalidSize(values.len())),
        };
        Ok(self)
    }

    pub fn with_extensions(mut self, extensions: Option<Vec<String>>) -> Self {
        self.extensions = extensions.filter(|e| !e.is_empty());
        self
    }

    pub fn apply(&self, mut config: ReconstructConfig) -> ReconstructConfig {
        if let Some(threshold) = self.threshold {
            config = config.with_threshold(threshold);
        }
        if let Some(size) = self.size {
            config = config.with_target_size(Some(size));
        }
        if let Some(extensions) = &self.extensions {
            config = config.with_extensions(extensions.iter().cloned());
        }
        config
    }
}

/// Read the configuration file (or start from defaults), apply the overrides
/// and validate the result.
pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<ReconstructConfig, CliError> {
    let base = match path {
        Some(path) => ReconstructConfig::from_file(path)?,
        None => ReconstructConfig::default(),
    };
    let config = overrides.apply(base);
    config.validate()?;
    Ok(config)
}

/// Default configuration as TOML, or its JSON schema.
pub fn render_config(schema: bool) -> Result<String, CliError> {
    if schema {
        Ok(serde_json::to_string_pretty(&ReconstructConfig::schema())?)
    } else {
        Ok(ReconstructConfig::default().to_toml()?)
    }
}

/// Write the batch summary as pretty JSON.
pub fn write_report(report: &BatchReport, path: &Path) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconstruct::ErrorKind;

    #[test]
    fn test_overrides_take_precedence_over_file() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "threshold = 200\nblend_weight = 0.5\n").expect("Should write config");

        let overrides = ConfigOverrides::default()
            .with_threshold(Some(230))
            .with_size(Some(&[320, 240][..]))
            .expect("Should accept two values");
        let config = load_config(Some(&path), &overrides).expect("Should load");

        assert_eq!(config.threshold, 230);
        assert_eq!(config.blend_weight, 0.5);
        assert_eq!(config.target_size, Some(TargetSize::new(320, 240)));
    }

    #[test]
    fn test_out_of_range_threshold_is_rejected() {
        let overrides = ConfigOverrides::default().with_threshold(Some(300));
        let err = load_config(None, &overrides).unwrap_err();
        match err {
            CliError::Reconstruct(inner) => assert_eq!(inner.kind(), ErrorKind::InvalidInput),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_size_needs_two_values() {
        assert!(matches!(
            ConfigOverrides::default().with_size(Some(&[100][..])),
            Err(CliError::InvalidSize(1))
        ));
    }

    #[test]
    fn test_empty_extension_list_keeps_defaults() {
        let overrides = ConfigOverrides::default().with_extensions(Some(vec![]));
        let config = load_config(None, &overrides).expect("Should load");
        assert_eq!(config.extensions, ReconstructConfig::default().extensions);

        let overrides = ConfigOverrides::default().with_extensions(Some(vec!["tiff".into()]));
        let config = load_config(None, &overrides).expect("Should load");
        assert_eq!(config.extensions, vec!["tiff".to_string()]);
    }

    #[test]
    fn test_render_config() {
        let toml = render_config(false).expect("Should render TOML");
        assert!(toml.contains("threshold = 240"));

        let schema = render_config(true).expect("Should render schema");
        let value: serde_json::Value = serde_json::from_str(&schema).expect("Should be JSON");
        assert!(value["properties"]["blend_weight"].is_object());
    }
}
