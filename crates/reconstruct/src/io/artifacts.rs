use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    config::OutputFormat,
    error::{ReconstructError, Result},
};

/// Output files written for one processed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub reconstructed: PathBuf,
    pub mask: PathBuf,
    pub edges: PathBuf,
    pub comparison: PathBuf,
}

impl ArtifactPaths {
    pub fn new(output_dir: &Path, base: &str, format: OutputFormat) -> Self {
        let ext = format.extension();
        let file = |suffix: &str| output_dir.join(format!("{base}_{suffix}.{ext}"));
        Self {
            reconstructed: file("reconstructed"),
            mask: file("mask"),
            edges: file("edges"),
            comparison: file("comparison"),
        }
    }

    pub fn for_input(output_dir: &Path, input: &Path, format: OutputFormat) -> Result<Self> {
        Ok(Self::new(output_dir, &base_name(input)?, format))
    }
}

/// File name without directory and extension.
pub fn base_name(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| ReconstructError::invalid("input", path.display(), "path has no file name"))
}

/// Files directly inside `dir` whose extension matches one of `extensions`,
/// ignoring case and any leading dot. Sorted by path.
pub fn list_images(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ReconstructError::NotFound {
            path: dir.to_path_buf(),
        });
    }

    let wanted: Vec<String> = extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .collect();

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| wanted.iter().any(|w| w.eq_ignore_ascii_case(ext)));
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names() {
        let paths = ArtifactPaths::for_input(Path::new("out"), Path::new("faces/alice.PNG"), OutputFormat::Jpg)
            .expect("Should derive paths");

        assert_eq!(paths.reconstructed, Path::new("out/alice_reconstructed.jpg"));
        assert_eq!(paths.mask, Path::new("out/alice_mask.jpg"));
        assert_eq!(paths.edges, Path::new("out/alice_edges.jpg"));
        assert_eq!(paths.comparison, Path::new("out/alice_comparison.jpg"));
    }

    #[test]
    fn test_listing_filters_extensions_case_insensitively() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        for name in ["b.JPG", "a.png", "c.txt", "d.jpeg", "e.Bmp", "noext"] {
            fs::write(dir.path().join(name), b"").expect("Should write file");
        }
        fs::create_dir(dir.path().join("nested.png")).expect("Should create dir");
        fs::write(dir.path().join("nested.png").join("inner.png"), b"").expect("Should write file");

        let extensions: Vec<String> = crate::config::DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect();
        let files = list_images(dir.path(), &extensions).expect("Should list");
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string())
            .collect();

        assert_eq!(names, vec!["a.png", "b.JPG", "d.jpeg", "e.Bmp"]);
    }

    #[test]
    fn test_missing_directory() {
        let err = list_images(Path::new("/definitely/not/here"), &["png".to_string()]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);
    }
}
