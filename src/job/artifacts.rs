//! Flat-file artifact storage keyed by job id

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::job::JobId;

/// What an artifact file holds for its job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactRole {
    /// Input image bytes as received
    Image,
    /// Input image re-encoded after its alpha channel was dropped
    ImageFixed,
    /// Mask, overwritten in place with the normalized grayscale version
    Mask,
    /// Backend output
    Result,
}

impl ArtifactRole {
    pub fn file_suffix(&self) -> &'static str {
        match self {
            ArtifactRole::Image => "_image.png",
            ArtifactRole::ImageFixed => "_image_fixed.jpg",
            ArtifactRole::Mask => "_mask.png",
            ArtifactRole::Result => "_result.jpg",
        }
    }

    fn in_output_dir(&self) -> bool {
        matches!(self, ArtifactRole::Result)
    }
}

/// Every path a job may write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub image: PathBuf,
    pub image_fixed: PathBuf,
    pub mask: PathBuf,
    pub result: PathBuf,
}

impl ArtifactPaths {
    pub fn get(&self, role: ArtifactRole) -> &Path {
        match role {
            ArtifactRole::Image => &self.image,
            ArtifactRole::ImageFixed => &self.image_fixed,
            ArtifactRole::Mask => &self.mask,
            ArtifactRole::Result => &self.result,
        }
    }
}

/// Handler for the input and output artifact directories
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Ensure both directories exist
    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.input_dir, &self.output_dir] {
            if !dir.exists() {
                fs::create_dir_all(dir).await?;
                debug!(path = ?dir, "Created artifact directory");
            }
        }
        Ok(())
    }

    /// `<dir>/<job_id><suffix>` for `role`
    pub fn path_for(&self, job_id: &JobId, role: ArtifactRole) -> PathBuf {
        let dir = if role.in_output_dir() {
            &self.output_dir
        } else {
            &self.input_dir
        };
        dir.join(format!("{}{}", job_id, role.file_suffix()))
    }

    pub fn paths_for(&self, job_id: &JobId) -> ArtifactPaths {
        ArtifactPaths {
            image: self.path_for(job_id, ArtifactRole::Image),
            image_fixed: self.path_for(job_id, ArtifactRole::ImageFixed),
            mask: self.path_for(job_id, ArtifactRole::Mask),
            result: self.path_for(job_id, ArtifactRole::Result),
        }
    }

    /// Write (or overwrite) an artifact file
    pub async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        fs::write(path, data).await.map_err(|e| {
            AppError::Internal(format!("Failed to write artifact {}: {}", path.display(), e))
        })?;
        debug!(path = ?path, size = data.len(), "Saved artifact");
        Ok(())
    }
}
