//! 分類エンドポイント。
//!
//! 分類そのものは同期処理なので、ブロッキングスレッドで実行し、全体に時間制限を掛ける。
use std::time::Instant;

use axum::Json;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::{info, warn};

use super::ApiError;
use crate::app::state::AppState;
use crate::domain::FinalResult;
use crate::error::ClassifyError;
use crate::observability::ClassifyPath;

const IMAGE_FIELD: &str = "image";

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Handler for POST /classify/text
pub async fn classify_text_handler(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<FinalResult>, ApiError> {
    let metrics = state.telemetry.metrics();
    let text = match payload {
        Ok(Json(TextRequest { text: Some(text) })) => text,
        _ => {
            metrics.record_failure(ClassifyPath::Text, "input_validation");
            return Err(ApiError::bad_request(
                "No text provided",
                "request body must be JSON with a \"text\" field",
            ));
        }
    };

    let started = Instant::now();
    let classifier = state.classifier.clone();
    let result = run_blocking(&state, ClassifyPath::Text, move || {
        classifier.classify_text(&text)
    })
    .await?;

    metrics.record_text(result.category, started.elapsed().as_secs_f64());
    info!(category = %result.category, confidence = result.confidence, "text classified");
    Ok(Json(result))
}

/// Handler for POST /classify/image
pub async fn classify_image_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FinalResult>, ApiError> {
    let metrics = state.telemetry.metrics();
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(error) => {
            metrics.record_failure(ClassifyPath::Image, "input_validation");
            return Err(error);
        }
    };
    info!(filename = %upload.filename, bytes = upload.bytes.len(), "image received");

    let started = Instant::now();
    let classifier = state.classifier.clone();
    let classification = run_blocking(&state, ClassifyPath::Image, move || {
        classifier.classify_image_traced(&upload.bytes, &upload.filename)
    })
    .await?;

    metrics.record_image(&classification, started.elapsed().as_secs_f64());
    Ok(Json(classification.result))
}

struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Upload, ApiError> {
    let missing = || ApiError::bad_request("No image file provided", "multipart field \"image\" is required");
    let mut multipart = multipart.map_err(|_| missing())?;

    loop {
        let field = multipart.next_field().await.map_err(|error| {
            ApiError::new(error.status(), "Invalid upload", error.body_text())
        })?;
        let Some(field) = field else {
            return Err(missing());
        };
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(ApiError::bad_request(
                "Empty filename",
                "the uploaded file has no filename",
            ));
        }
        let bytes = field.bytes().await.map_err(|error| {
            ApiError::new(error.status(), "Invalid upload", error.body_text())
        })?;
        return Ok(Upload {
            filename,
            bytes: bytes.to_vec(),
        });
    }
}

/// 分類をブロッキングスレッドで実行する。時間切れは 504、ワーカーの異常終了は 500。
async fn run_blocking<T, F>(state: &AppState, path: ClassifyPath, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ClassifyError> + Send + 'static,
{
    let metrics = state.telemetry.metrics();
    let task = tokio::task::spawn_blocking(work);

    match tokio::time::timeout(state.classify_timeout, task).await {
        Ok(Ok(Ok(value))) => Ok(value),
        Ok(Ok(Err(error))) => {
            warn!(path = path.as_str(), error = %error, "classification rejected");
            let (kind, api_error) = classify_error_response(path, error);
            metrics.record_failure(path, kind);
            Err(api_error)
        }
        Ok(Err(join_error)) => {
            warn!(path = path.as_str(), error = %join_error, "classification worker failed");
            metrics.record_failure(path, "worker");
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Classification failed",
                "classification worker terminated unexpectedly",
            ))
        }
        Err(_) => {
            warn!(
                path = path.as_str(),
                timeout_ms = state.classify_timeout.as_millis() as u64,
                "classification timed out"
            );
            metrics.record_failure(path, "timeout");
            Err(ApiError::new(
                StatusCode::GATEWAY_TIMEOUT,
                "Classification timed out",
                format!(
                    "classification did not finish within {} ms",
                    state.classify_timeout.as_millis()
                ),
            ))
        }
    }
}

fn classify_error_response(path: ClassifyPath, error: ClassifyError) -> (&'static str, ApiError) {
    match error {
        ClassifyError::InputValidation(message) => {
            let summary = match path {
                ClassifyPath::Text => "Invalid text input",
                ClassifyPath::Image => "Invalid image input",
            };
            ("input_validation", ApiError::bad_request(summary, message))
        }
        ClassifyError::Processing(message) => (
            "processing",
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing image",
                message,
            ),
        ),
    }
}
