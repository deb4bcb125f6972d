//! Router construction

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::handlers;
use crate::AppState;

/// Build the application router
pub async fn create_router(state: Arc<AppState>) -> Router {
    let server = &state.settings.server;

    let mut router = Router::new()
        .route("/api/image-mask", post(handlers::image_mask))
        .route("/health", get(handlers::health))
        .route("/health/backend", get(handlers::backend_health))
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(TraceLayer::new_for_http());

    if server.cors_allow_any_origin {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}
