//! Unit tests for the pipeline driven directly, without HTTP

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use inpaint_gateway::{
    backend::{InpaintBackend, InpaintRequest},
    codec::data_url,
    config::Settings,
    error::ErrorKind,
    pipeline::{InferenceRequest, InpaintPipeline},
    AppError, Result,
};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fails with a non-backend error kind to check it is reported as a backend failure
struct IoFailingBackend {
    calls: AtomicUsize,
}

#[async_trait]
impl InpaintBackend for IoFailingBackend {
    fn name(&self) -> &str {
        "io-failing"
    }

    async fn infer(&self, _request: InpaintRequest) -> Result<RgbImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, "device lost")))
    }

    async fn health_check(&self) -> bool {
        false
    }
}

fn png_data_url(width: u32, height: u32) -> String {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([1, 2, 3])))
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .unwrap();
    data_url::encode(&buf, "image/png")
}

async fn pipeline(backend: Arc<IoFailingBackend>, dir: &std::path::Path) -> InpaintPipeline {
    let mut settings = Settings::default();
    settings.storage.input_dir = dir.join("in");
    settings.storage.output_dir = dir.join("out");
    let pipeline = InpaintPipeline::from_settings(&settings, backend);
    pipeline.store().ensure_dirs().await.unwrap();
    pipeline
}

#[tokio::test]
async fn test_any_backend_failure_is_backend_kind() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(IoFailingBackend { calls: AtomicUsize::new(0) });
    let pipeline = pipeline(backend.clone(), dir.path()).await;

    let err = pipeline
        .run(InferenceRequest {
            image: png_data_url(8, 8),
            mask: png_data_url(8, 8),
            positive_prompt: "a cat".to_string(),
            negative_prompt: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Backend);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert!(!pipeline.gate().snapshot().held);
    assert_eq!(pipeline.gate().snapshot().released, 1);
}

#[tokio::test]
async fn test_decode_failure_creates_no_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(IoFailingBackend { calls: AtomicUsize::new(0) });
    let pipeline = pipeline(backend.clone(), dir.path()).await;

    let err = pipeline
        .run(InferenceRequest {
            image: "not a data url".to_string(),
            mask: png_data_url(8, 8),
            positive_prompt: "a cat".to_string(),
            negative_prompt: Some("dogs".to_string()),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    assert_eq!(std::fs::read_dir(pipeline.store().input_dir()).unwrap().count(), 0);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_oversized_input_keeps_gate_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(IoFailingBackend { calls: AtomicUsize::new(0) });
    let pipeline = pipeline(backend.clone(), dir.path()).await;

    let err = pipeline
        .run(InferenceRequest {
            image: png_data_url(2, 5000),
            mask: png_data_url(2, 5000),
            positive_prompt: "a cat".to_string(),
            negative_prompt: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::SizeLimitExceeded { width: 2, height: 5000, limit: 4096 }));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    assert_eq!(pipeline.gate().snapshot().released, 0);
}
