//! Request handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

use crate::error::{AppError, Result};
use crate::gateway::GateSnapshot;
use crate::pipeline::InferenceRequest;
use crate::response::InpaintResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: String,
    pub gate: GateSnapshot,
}

#[derive(Debug, Serialize)]
pub struct BackendHealthResponse {
    pub backend: String,
    pub reachable: bool,
}

/// `POST /api/image-mask`
///
/// The pipeline runs on its own task: a client that disconnects does not
/// cancel a queued or running job, so the accelerator is never abandoned
/// mid-inference with the gate released.
pub async fn image_mask(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<InferenceRequest>, JsonRejection>,
) -> Result<Json<InpaintResponse>> {
    let limit = state.settings.server.max_body_bytes;
    let Json(request) = payload.map_err(|rejection| reject_body(rejection, limit))?;

    let pipeline = state.pipeline.clone();
    let response = tokio::spawn(async move { pipeline.run(request).await })
        .await
        .map_err(|e| {
            error!(error = %e, "Pipeline task aborted");
            AppError::Internal("Job did not complete".to_string())
        })??;

    Ok(Json(response))
}

/// A body cut off by the size limit is an oversized upload, not malformed JSON
fn reject_body(rejection: JsonRejection, limit: usize) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(limit, "Request body exceeds the configured limit");
        return AppError::BodyTooLarge { limit };
    }
    AppError::MalformedInput(rejection.body_text())
}

/// `GET /health` - liveness plus admission gate state
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.pipeline.backend().name().to_string(),
        gate: state.pipeline.gate().snapshot(),
    })
}

/// `GET /health/backend` - probe the inference worker
pub async fn backend_health(State(state): State<Arc<AppState>>) -> Json<BackendHealthResponse> {
    let backend = state.pipeline.backend();
    Json(BackendHealthResponse {
        backend: backend.name().to_string(),
        reachable: backend.health_check().await,
    })
}
