//! Inpainting Gateway
//!
//! Accepts an image, a mask and a prompt over HTTP, normalizes them, and
//! forwards the job to an inference worker that owns a single
//! memory-constrained accelerator. An admission gate lets one job at a time
//! reach the worker.

pub mod api;
pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod gateway;
pub mod job;
pub mod media;
pub mod pipeline;
pub mod response;

pub use error::{AppError, Result};

use std::sync::Arc;

use pipeline::InpaintPipeline;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub pipeline: Arc<InpaintPipeline>,
}
