//! Response encoding - result image to JPEG data URL plus artifact paths

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::codec::data_url;
use crate::error::Result;
use crate::job::Job;
use crate::media::encode;

/// Default JPEG quality of results
pub const DEFAULT_RESULT_QUALITY: u8 = 95;

/// Artifact locations reported to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedPaths {
    pub image_path: String,
    pub result_path: String,
}

/// Successful reply body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InpaintResponse {
    pub job_id: String,
    /// `data:image/jpeg;base64,...`
    pub image: String,
    pub saved: SavedPaths,
}

/// Encoded result: the bytes to persist and the payload to send
#[derive(Debug, Clone)]
pub struct EncodedResult {
    pub jpeg: Vec<u8>,
    pub response: InpaintResponse,
}

/// Serializes backend output for the wire
#[derive(Debug, Clone)]
pub struct ResponseEncoder {
    quality: u8,
}

impl Default for ResponseEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_RESULT_QUALITY)
    }
}

impl ResponseEncoder {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }

    /// Encode `result` for `job`. `image_path` is the input artifact the job reports.
    pub fn encode(&self, job: &Job, image_path: &Path, result: &RgbImage) -> Result<EncodedResult> {
        let jpeg = encode::jpeg(result, self.quality)?;
        let response = InpaintResponse {
            job_id: job.id.to_string(),
            image: data_url::encode(&jpeg, encode::JPEG_MIME),
            saved: SavedPaths {
                image_path: image_path.display().to_string(),
                result_path: job.artifacts.result.display().to_string(),
            },
        };
        Ok(EncodedResult { jpeg, response })
    }
}
