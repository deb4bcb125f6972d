//! Main entry point for the inpainting gateway

use inpaint_gateway::{
    api,
    backend::{HttpBackend, InpaintBackend},
    config::Settings,
    pipeline::InpaintPipeline,
    AppState,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::load()?;
    settings.validate()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    if settings.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }

    info!("Starting inpainting gateway");
    info!(
        "Loaded configuration: server={}:{} backend={}",
        settings.server.host, settings.server.port, settings.backend.endpoint
    );

    // Backend is constructed once and injected; the worker owns the model
    let backend: Arc<dyn InpaintBackend> = Arc::new(HttpBackend::new(&settings.backend)?);

    let pipeline = InpaintPipeline::from_settings(&settings, backend);
    pipeline.store().ensure_dirs().await?;
    info!(
        input_dir = %pipeline.store().input_dir().display(),
        output_dir = %pipeline.store().output_dir().display(),
        "Artifact directories ready"
    );

    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    let app_state = Arc::new(AppState {
        settings: Arc::new(settings),
        pipeline: Arc::new(pipeline),
    });

    // Build the router
    let app = api::routes::create_router(app_state).await;

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
