//! Gated inpainting pipeline
//!
//! decode -> normalize -> persist inputs -> [gate] infer [/gate] -> encode -> persist result
//!
//! Validation happens before the gate is touched. The gate is held only
//! around the backend call and is released on every exit path.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};

use crate::backend::{InpaintBackend, InpaintRequest};
use crate::codec::{data_url, DecodedAsset};
use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::gateway::AdmissionGate;
use crate::job::{ArtifactStore, Job, JobState};
use crate::media::{encode, NormalizedImage, NormalizedMask, Normalizer};
use crate::response::{InpaintResponse, ResponseEncoder};

/// Client request as received
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceRequest {
    /// `data:image/...;base64,...`
    pub image: String,
    /// `data:image/...;base64,...`
    pub mask: String,
    pub positive_prompt: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
}

/// Pipeline with its injected backend and the process-wide gate
pub struct InpaintPipeline {
    backend: Arc<dyn InpaintBackend>,
    gate: AdmissionGate,
    store: ArtifactStore,
    normalizer: Normalizer,
    encoder: ResponseEncoder,
    fixed_jpeg_quality: u8,
}

impl InpaintPipeline {
    pub fn new(
        backend: Arc<dyn InpaintBackend>,
        store: ArtifactStore,
        normalizer: Normalizer,
        encoder: ResponseEncoder,
    ) -> Self {
        Self {
            backend,
            gate: AdmissionGate::new(),
            store,
            normalizer,
            encoder,
            fixed_jpeg_quality: 100,
        }
    }

    /// Build a pipeline from settings around `backend`
    pub fn from_settings(settings: &Settings, backend: Arc<dyn InpaintBackend>) -> Self {
        let limits = &settings.limits;
        Self::new(
            backend,
            ArtifactStore::new(&settings.storage.input_dir, &settings.storage.output_dir),
            Normalizer::new(limits.max_side).with_working_max_side(limits.working_max_side),
            ResponseEncoder::new(limits.result_jpeg_quality),
        )
        .with_fixed_jpeg_quality(limits.fixed_jpeg_quality)
    }

    pub fn with_fixed_jpeg_quality(mut self, quality: u8) -> Self {
        self.fixed_jpeg_quality = quality;
        self
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn backend(&self) -> &Arc<dyn InpaintBackend> {
        &self.backend
    }

    /// Run one request end to end
    pub async fn run(&self, request: InferenceRequest) -> Result<InpaintResponse> {
        let (image, mask) = match decode_request(&request) {
            Ok(assets) => assets,
            Err(e) => {
                warn!(error = %e, "Rejected request before decoding");
                return Err(e);
            }
        };

        let mut job = Job::new(&self.store);
        job.advance(JobState::Decoded);
        let span = info_span!("job", job_id = %job.id);

        async {
            info!(
                created_at = %job.created_at,
                image_mime = %image.mime,
                mask_mime = %mask.mime,
                "Job created"
            );
            match self.process(&mut job, request, image, mask).await {
                Ok(response) => {
                    info!(result_path = %response.saved.result_path, "Job finished");
                    Ok(response)
                }
                Err(e) => {
                    job.advance(JobState::Failed(e.kind()));
                    warn!(state = ?job.state, error = %e, "Job failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn process(
        &self,
        job: &mut Job,
        request: InferenceRequest,
        image: DecodedAsset,
        mask: DecodedAsset,
    ) -> Result<InpaintResponse> {
        // Raw inputs as received
        self.store.write(&job.artifacts.image, &image.bytes).await?;
        self.store.write(&job.artifacts.mask, &mask.bytes).await?;

        let normalizer = self.normalizer.clone();
        let fixed_jpeg_quality = self.fixed_jpeg_quality;
        let prepared = blocking(move || {
            prepare_inputs(&normalizer, &image.bytes, &mask.bytes, fixed_jpeg_quality)
        })
        .await?;

        let image_path = match &prepared.fixed_jpeg {
            Some(fixed) => {
                self.store.write(&job.artifacts.image_fixed, fixed).await?;
                debug!("Converted RGBA -> RGB (alpha dropped)");
                job.artifacts.image_fixed.clone()
            }
            None => job.artifacts.image.clone(),
        };
        // Mask artifact is replaced by its normalized form
        self.store.write(&job.artifacts.mask, &prepared.mask_png).await?;

        job.advance(JobState::Normalized);
        debug!(
            width = prepared.image.width(),
            height = prepared.image.height(),
            "Inputs normalized"
        );

        let backend_request = InpaintRequest {
            job_id: job.id.to_string(),
            image: prepared.image,
            mask: prepared.mask,
            positive_prompt: request.positive_prompt,
            negative_prompt: request.negative_prompt,
        };

        let admitted = &mut *job;
        let backend = &self.backend;
        let result = self
            .gate
            .run(move || async move {
                admitted.advance(JobState::Admitted);
                info!(backend = %backend.name(), "Starting inpainting");
                admitted.advance(JobState::Invoked);
                backend.infer(backend_request).await.map_err(|e| {
                    error!(backend = %backend.name(), error = %e, "Backend invocation failed");
                    match e {
                        AppError::Backend(_) => e,
                        other => AppError::Backend(other.to_string()),
                    }
                })
            })
            .await?;

        let encoder = self.encoder.clone();
        let finished = job.clone();
        let encoded = blocking(move || encoder.encode(&finished, &image_path, &result)).await?;
        self.store.write(&job.artifacts.result, &encoded.jpeg).await?;
        job.advance(JobState::Encoded);

        Ok(encoded.response)
    }
}

/// Normalized inputs and the encoded artifacts derived from them
struct PreparedInputs {
    image: NormalizedImage,
    mask: NormalizedMask,
    /// Present only when alpha was dropped
    fixed_jpeg: Option<Vec<u8>>,
    mask_png: Vec<u8>,
}

fn prepare_inputs(normalizer: &Normalizer, image: &[u8], mask: &[u8], fixed_jpeg_quality: u8) -> Result<PreparedInputs> {
    let image = normalizer.normalize_image(image)?;
    let fixed_jpeg = if image.alpha_dropped {
        Some(encode::jpeg(&image.pixels, fixed_jpeg_quality)?)
    } else {
        None
    };

    let mask = normalizer.normalize_mask(mask)?;
    let mask_png = encode::png_gray(&mask.pixels)?;

    let (image, mask) = normalizer.align(image, mask);
    Ok(PreparedInputs {
        image,
        mask,
        fixed_jpeg,
        mask_png,
    })
}

/// Run pixel work on the blocking pool, inside the caller's span
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let span = Span::current();
    tokio::task::spawn_blocking(move || span.in_scope(work))
        .await
        .map_err(|e| AppError::Internal(format!("Image task did not complete: {}", e)))?
}

/// Prompt check and data-URL decoding; nothing here touches disk or the gate
fn decode_request(request: &InferenceRequest) -> Result<(DecodedAsset, DecodedAsset)> {
    if request.positive_prompt.trim().is_empty() {
        return Err(AppError::MalformedInput("positive_prompt must not be empty".to_string()));
    }
    let image = data_url::decode(&request.image)?;
    let mask = data_url::decode(&request.mask)?;
    Ok((image, mask))
}
