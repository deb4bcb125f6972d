//! Common traits and types for inpainting backends

use async_trait::async_trait;
use image::RgbImage;

use crate::error::Result;
use crate::media::{NormalizedImage, NormalizedMask};

/// Normalized inputs handed to a backend
#[derive(Debug, Clone)]
pub struct InpaintRequest {
    /// Correlation id, for backend-side logging only
    pub job_id: String,

    pub image: NormalizedImage,

    pub mask: NormalizedMask,

    /// What to paint into the masked region
    pub positive_prompt: String,

    /// Things to avoid; the backend picks its own default when absent
    pub negative_prompt: Option<String>,
}

/// Trait for inpainting backends.
///
/// Implementations own all model state. The pipeline calls `infer` at most
/// once per job and only while holding the admission gate; any error is
/// reported as a backend failure and never retried.
#[async_trait]
pub trait InpaintBackend: Send + Sync {
    /// Get the backend name
    fn name(&self) -> &str;

    /// Run inpainting and return the resulting image
    async fn infer(&self, request: InpaintRequest) -> Result<RgbImage>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;
}
