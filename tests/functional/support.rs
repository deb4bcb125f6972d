//! Shared fixtures: stub backends and request builders

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use inpaint_gateway::{
    api,
    backend::{InpaintBackend, InpaintRequest},
    codec::data_url,
    config::Settings,
    pipeline::InpaintPipeline,
    AppError, AppState, Result,
};
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Backend stub that counts calls and records the peak number of overlapping calls
#[derive(Default)]
pub struct CountingBackend {
    pub calls: AtomicUsize,
    pub active: AtomicUsize,
    pub peak: AtomicUsize,
    pub delay: Duration,
    /// Calls with index below this value fail
    pub fail_first: usize,
}

impl CountingBackend {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn failing_first(n: usize) -> Self {
        Self {
            fail_first: n,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InpaintBackend for CountingBackend {
    fn name(&self) -> &str {
        "counting-stub"
    }

    async fn infer(&self, request: InpaintRequest) -> Result<RgbImage> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if index < self.fail_first {
            return Err(AppError::Backend("simulated CUDA out of memory".to_string()));
        }

        let (width, height) = request.image.dimensions();
        Ok(RgbImage::from_pixel(width, height, Rgb([0, 128, 255])))
    }

    async fn health_check(&self) -> bool {
        true
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub backend: Arc<CountingBackend>,
    _dirs: TempDir,
}

pub async fn test_app(backend: CountingBackend) -> TestApp {
    test_app_with(backend, |_| {}).await
}

pub async fn test_app_with(backend: CountingBackend, configure: impl FnOnce(&mut Settings)) -> TestApp {
    let dirs = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.storage.input_dir = dirs.path().join("input");
    settings.storage.output_dir = dirs.path().join("output");
    configure(&mut settings);

    let backend = Arc::new(backend);
    let pipeline = InpaintPipeline::from_settings(&settings, backend.clone());
    pipeline.store().ensure_dirs().await.unwrap();

    let state = Arc::new(AppState {
        settings: Arc::new(settings),
        pipeline: Arc::new(pipeline),
    });
    let router = api::routes::create_router(state.clone()).await;

    TestApp {
        router,
        state,
        backend,
        _dirs: dirs,
    }
}

fn png(image: DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png).unwrap();
    buf
}

pub fn rgba_data_url(width: u32, height: u32) -> String {
    let image = RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 90, (x + y) as u8]));
    data_url::encode(&png(DynamicImage::ImageRgba8(image)), "image/png")
}

pub fn rgb_data_url(width: u32, height: u32) -> String {
    let image = RgbImage::from_pixel(width, height, Rgb([12, 34, 56]));
    data_url::encode(&png(DynamicImage::ImageRgb8(image)), "image/png")
}

/// White square in the middle, painted as RGBA the way browser canvases export masks
pub fn mask_data_url(width: u32, height: u32) -> String {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        let inside = x > width / 4 && x < 3 * width / 4 && y > height / 4 && y < 3 * height / 4;
        if inside {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    });
    data_url::encode(&png(DynamicImage::ImageRgba8(image)), "image/png")
}

pub fn gray_mask_data_url(width: u32, height: u32) -> String {
    let image = GrayImage::from_pixel(width, height, Luma([255]));
    data_url::encode(&png(DynamicImage::ImageLuma8(image)), "image/png")
}

pub fn body(image: &str, mask: &str, prompt: &str) -> Value {
    json!({
        "image": image,
        "mask": mask,
        "positive_prompt": prompt,
    })
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
