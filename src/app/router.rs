use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};

use super::state::AppState;
use crate::handler::classify::{classify_image_handler, classify_text_handler};
use crate::handler::health::health_handler;
use crate::handler::metrics::metrics_handler;

/// Build the HTTP router (health, metrics and both classification routes).
pub fn router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    let classify_router = Router::new()
        .route("/classify/image", post(classify_image_handler))
        .route("/classify/text", post(classify_text_handler))
        .layer(body_limit);

    let ops_router = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(classify_router)
        .merge(ops_router)
        .with_state(state)
}
