use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tracing::debug;

use crate::app::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub models: ModelStatus,
}

#[derive(Debug, Serialize)]
pub struct ModelStatus {
    pub image_classifier: String,
    pub text_classifier: &'static str,
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "OK",
        message: "Waste classification service is running",
        models: ModelStatus {
            image_classifier: state.classifier.capabilities().summary(),
            text_classifier: "keyword",
        },
    })
}
