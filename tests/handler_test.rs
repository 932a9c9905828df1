use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{Value, json};
use waste_sorter::WasteClassifier;
use waste_sorter::app::router::router;
use waste_sorter::app::state::AppState;
use waste_sorter::classification::CapabilitySet;
use waste_sorter::domain::KnowledgeBase;
use waste_sorter::observability::Telemetry;
use waste_sorter::test_support::{SlowVision, png_bytes};

fn state_with(capabilities: CapabilitySet, classify_timeout: Duration) -> AppState {
    AppState {
        classifier: Arc::new(WasteClassifier::new(
            capabilities,
            Arc::new(KnowledgeBase::embedded().unwrap()),
        )),
        telemetry: Telemetry::new().unwrap(),
        classify_timeout,
        max_upload_bytes: 1024 * 1024,
    }
}

fn create_test_server() -> TestServer {
    TestServer::new(router(state_with(
        CapabilitySet::absent(),
        Duration::from_secs(5),
    )))
    .unwrap()
}

fn image_form(filename: &str, bytes: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        "image",
        Part::bytes(bytes)
            .file_name(filename)
            .mime_type("image/png"),
    )
}

#[tokio::test]
async fn test_health_endpoint_reports_models() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "OK");
    assert_eq!(body["models"]["text_classifier"], "keyword");
    assert_eq!(body["models"]["image_classifier"], "filename_heuristic");
}

#[tokio::test]
async fn test_classify_text_returns_guidance() {
    let server = create_test_server();

    let response = server
        .post("/classify/text")
        .json(&json!({ "text": "banana peel for compost" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["category"], "Organic");
    assert_eq!(body["waste_name"], "Organic Waste");
    assert!(body["confidence"].as_f64().unwrap() > 0.65);
    assert!(body["storage"]["instructions"].is_array());
}

#[tokio::test]
async fn test_classify_text_without_field_is_400() {
    let server = create_test_server();

    let response = server.post("/classify/text").json(&json!({})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "No text provided");
}

#[tokio::test]
async fn test_classify_text_with_blank_text_is_400() {
    let server = create_test_server();

    let response = server
        .post("/classify/text")
        .json(&json!({ "text": "   " }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid text input");
}

#[tokio::test]
async fn test_classify_text_with_malformed_json_is_400() {
    let server = create_test_server();

    let response = server
        .post("/classify/text")
        .text("{not json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_classify_image_by_filename() {
    let server = create_test_server();

    let response = server
        .post("/classify/image")
        .multipart(image_form("Battery_Charger.PNG", png_bytes(12, 12, [0, 0, 0])))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["category"], "Hazardous");
    assert_eq!(body["detection_method"], "Filename analysis: detected 'battery'");
}

#[tokio::test]
async fn test_classify_image_without_field_is_400() {
    let server = create_test_server();

    let form = MultipartForm::new().add_text("note", "no image here");
    let response = server.post("/classify/image").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "No image file provided");
}

#[tokio::test]
async fn test_classify_image_with_empty_filename_is_400() {
    let server = create_test_server();

    let response = server
        .post("/classify/image")
        .multipart(image_form("", png_bytes(4, 4, [1, 1, 1])))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Empty filename");
}

#[tokio::test]
async fn test_classify_image_with_garbage_bytes_is_500() {
    let server = create_test_server();

    let response = server
        .post("/classify/image")
        .multipart(image_form("bottle.png", b"not an image".to_vec()))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Error processing image");
}

#[tokio::test]
async fn test_slow_capability_hits_boundary_timeout() {
    let capabilities = CapabilitySet::absent().with_generic_vision(Arc::new(SlowVision {
        delay: Duration::from_millis(500),
    }));
    let server =
        TestServer::new(router(state_with(capabilities, Duration::from_millis(50)))).unwrap();

    let response = server
        .post("/classify/image")
        .multipart(image_form("photo.png", png_bytes(4, 4, [1, 1, 1])))
        .await;

    response.assert_status(StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_metrics_count_decisions() {
    let server = create_test_server();

    server
        .post("/classify/image")
        .multipart(image_form("glass_bottle.png", png_bytes(4, 4, [1, 1, 1])))
        .await
        .assert_status_ok();
    server
        .post("/classify/text")
        .json(&json!({ "text": "old phone" }))
        .await
        .assert_status_ok();

    let response = server.get("/metrics").await;
    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains("waste_pipeline_decisions_total{tier=\"filename_heuristic\"} 1"));
    assert!(text.contains("waste_classifications_total{category=\"E-Waste\",path=\"text\"} 1"));
    assert!(text.contains("waste_pipeline_escalations_total"));
}
