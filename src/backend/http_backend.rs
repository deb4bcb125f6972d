//! HTTP inference worker client
//!
//! The worker owns the model and the accelerator. This client ships the
//! normalized image and mask as PNG data URLs and reads back one image.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::RgbImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::backend::traits::{InpaintBackend, InpaintRequest};
use crate::codec::data_url;
use crate::config::{BackendConfig, SamplerConfig};
use crate::error::{AppError, Result};
use crate::media::encode;

/// HTTP-based inpainting backend
pub struct HttpBackend {
    name: String,
    client: Client,
    endpoint: String,
    health_check_path: String,
    sampler: SamplerConfig,
}

/// Request body sent to the worker
#[derive(Debug, Serialize)]
struct ApiInpaintRequest<'a> {
    job_id: &'a str,
    image: String,
    mask: String,
    positive_prompt: &'a str,
    negative_prompt: &'a str,
    steps: u32,
    cfg: f32,
    grow_mask_by: u32,
    denoise: f32,
    max_side: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
}

/// Worker response; either field may carry the image
#[derive(Debug, Deserialize)]
struct ApiInpaintResponse {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

impl HttpBackend {
    /// Create a new HTTP backend from configuration
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            name: config.name.clone(),
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            health_check_path: config.health_check_path.clone(),
            sampler: config.sampler.clone(),
        })
    }

    fn inpaint_url(&self) -> String {
        format!("{}/inpaint", self.endpoint)
    }
}

/// Accept either a data URL or a bare base64 payload
fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    if payload.starts_with("data:") {
        return data_url::decode(payload)
            .map(|asset| asset.bytes)
            .map_err(|e| AppError::Backend(format!("Worker returned a malformed data URL: {}", e)));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::Backend(format!("Worker returned invalid base64: {}", e)))
}

#[async_trait]
impl InpaintBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn infer(&self, request: InpaintRequest) -> Result<RgbImage> {
        let image = data_url::encode(&encode::png_rgb(&request.image.pixels)?, encode::PNG_MIME);
        let mask = data_url::encode(&encode::png_gray(&request.mask.pixels)?, encode::PNG_MIME);

        let body = ApiInpaintRequest {
            job_id: &request.job_id,
            image,
            mask,
            positive_prompt: &request.positive_prompt,
            negative_prompt: request
                .negative_prompt
                .as_deref()
                .unwrap_or(&self.sampler.default_negative_prompt),
            steps: self.sampler.steps,
            cfg: self.sampler.cfg,
            grow_mask_by: self.sampler.grow_mask_by,
            denoise: self.sampler.denoise,
            max_side: self.sampler.max_side,
            seed: self.sampler.seed,
        };

        let url = self.inpaint_url();
        debug!(backend = %self.name, url = %url, job_id = %request.job_id, "Sending inpaint request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Backend(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Backend(format!("Worker returned {}: {}", status, text)));
        }

        let parsed: ApiInpaintResponse = response
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("Failed to parse response: {}", e)))?;

        let payload = parsed
            .image
            .or(parsed.b64_json)
            .ok_or_else(|| AppError::Backend("Worker response contained no image".to_string()))?;

        let bytes = decode_payload(&payload)?;
        let result = image::load_from_memory(&bytes)
            .map_err(|e| AppError::Backend(format!("Worker returned an undecodable image: {}", e)))?
            .to_rgb8();

        debug!(
            backend = %self.name,
            job_id = %request.job_id,
            width = result.width(),
            height = result.height(),
            "Received inpaint result"
        );
        Ok(result)
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}{}", self.endpoint, self.health_check_path);
        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(backend = %self.name, status = %response.status(), "Health check failed");
                false
            }
            Err(e) => {
                debug!(backend = %self.name, error = %e, "Health check failed");
                false
            }
        }
    }
}
