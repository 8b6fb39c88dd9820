//! Public asset copying.
//!
//! Copies the public directory into the build output. Symlinks are followed
//! and copied as regular files; the HTML entry template is left out since
//! every page is generated.

use std::{
    fs,
    path::{Path, PathBuf},
};

use sitepress_core::Config;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Asset copying errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Invalid asset path.
    #[error("invalid asset path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Copies a directory tree, skipping excluded files.
#[derive(Debug, Clone, Default)]
pub struct AssetCopier {
    exclude: Vec<PathBuf>,
}

impl AssetCopier {
    /// Create a copier that copies everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copier for the project public directory, excluding the entry template.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new().exclude(config.entry_template())
    }

    /// Skip the file at `path` (as found inside the source directory).
    #[must_use]
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclude.push(path.into());
        self
    }

    /// Copy `source_dir` into `dest_dir`. Returns the number of files copied.
    ///
    /// The destination is created even when the source does not exist.
    pub fn copy(&self, source_dir: &Path, dest_dir: &Path) -> Result<usize> {
        info!(
            source = %source_dir.display(),
            dest = %dest_dir.display(),
            "copying public assets"
        );

        fs::create_dir_all(dest_dir)?;

        if !source_dir.exists() {
            debug!("public directory does not exist, skipping");
            return Ok(0);
        }

        let mut count = 0;
        for entry in WalkDir::new(source_dir).follow_links(true) {
            let entry = entry?;
            let path = entry.path();

            if self.exclude.iter().any(|excluded| excluded == path) {
                debug!(path = %path.display(), "skipping excluded file");
                continue;
            }

            let relative = path
                .strip_prefix(source_dir)
                .map_err(|_| AssetError::InvalidPath(path.to_path_buf()))?;
            let dest_path = dest_dir.join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest_path)?;
            } else {
                if let Some(parent) = dest_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(path, &dest_path)?;
                count += 1;

                debug!(
                    src = %path.display(),
                    dest = %dest_path.display(),
                    "copied asset"
                );
            }
        }

        info!(count, "assets copied");
        Ok(count)
    }
}
