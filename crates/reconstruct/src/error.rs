use std::path::PathBuf;

use serde::Serialize;
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconstructError {
    #[error("Not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid value for `{field}`: {value} ({reason})")]
    InvalidConfig {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Dimension mismatch: image is {image_width}x{image_height}, {what} is {width}x{height}")]
    DimensionMismatch {
        what: &'static str,
        image_width: u32,
        image_height: u32,
        width: u32,
        height: u32,
    },

    #[error("Output name `{base}` produced by {} was already used by {}", second.display(), first.display())]
    OutputCollision {
        base: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("No white regions detected with threshold {threshold}")]
    EmptyMask { threshold: u8 },

    #[error("Failed to decode or encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported config format: {}. Please use .toml or .json files", path.display())]
    UnsupportedConfigFormat { path: PathBuf },
}

/// Coarse classification used when reporting failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    EmptyMask,
    IoFailure,
}

impl ReconstructError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidConfig { .. }
            | Self::DimensionMismatch { .. }
            | Self::OutputCollision { .. } => ErrorKind::InvalidInput,
            Self::EmptyMask { .. } => ErrorKind::EmptyMask,
            Self::Image(_)
            | Self::Io(_)
            | Self::TomlDe(_)
            | Self::TomlSer(_)
            | Self::Json(_)
            | Self::UnsupportedConfigFormat { .. } => ErrorKind::IoFailure,
        }
    }

    pub(crate) fn invalid(field: &'static str, value: impl ToString, reason: &'static str) -> Self {
        Self::InvalidConfig {
            field,
            value: value.to_string(),
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconstructError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = ReconstructError::EmptyMask { threshold: 255 };
        assert_eq!(err.kind(), ErrorKind::EmptyMask);
        assert_eq!(err.to_string(), "No white regions detected with threshold 255");

        let err = ReconstructError::invalid("blend_weight", 1.5, "must be within [0, 1]");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("1.5"));

        let err = ReconstructError::from(std::io::Error::other("disk full"));
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert_eq!(ErrorKind::IoFailure.to_string(), "io_failure");
    }
}
