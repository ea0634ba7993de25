//! HTTP surface tests driven through the router with `oneshot`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use heatmap_api::build_router;
use heatmap_api::config::ServiceConfig;
use heatmap_api::rasterize::{build_rasterizer, RasterizeError, Rasterizer};
use heatmap_api::state::AppState;
use serde_json::Value;
use tempfile::TempDir;
use test_utils::fixtures::*;
use test_utils::scratch_dir;
use tower::ServiceExt;

const BOUNDARY: &str = "heatmap-test-boundary";

/// Panics inside the backend instead of returning an error.
struct PanickingRasterizer;

#[async_trait]
impl Rasterizer for PanickingRasterizer {
    fn name(&self) -> &'static str {
        "panicking"
    }

    async fn rasterize(&self, _document: &Path, _image: &Path) -> Result<(), RasterizeError> {
        panic!("backend lost its renderer");
    }
}

fn test_config(dir: &TempDir) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.store.artifact_dir = dir.path().to_path_buf();
    config.raster.poll_attempts = 2;
    config.raster.poll_interval_ms = 10;
    config
}

async fn test_app() -> (Router, TempDir) {
    let dir = scratch_dir();
    let config = test_config(&dir);
    let rasterizer = build_rasterizer(&config.raster);
    let state = AppState::with_rasterizer(config, rasterizer, None)
        .await
        .unwrap();
    (build_router(Arc::new(state)), dir)
}

fn multipart_body(field: &str, file_name: Option<&str>, contents: &str) -> String {
    let disposition = match file_name {
        Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field, name),
        None => format!("form-data; name=\"{}\"", field),
    };
    format!(
        "--{b}\r\nContent-Disposition: {d}\r\nContent-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        d = disposition,
        c = contents
    )
}

fn upload_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn upload_csv(file_name: &str, contents: &str) -> Request<Body> {
    upload_request(multipart_body("file", Some(file_name), contents))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

// ============================================================================
// Pages
// ============================================================================

#[tokio::test]
async fn test_health() {
    let (app, _dir) = test_app().await;
    let (status, _, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_index_page() {
    let (app, _dir) = test_app().await;
    let (status, headers, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(String::from_utf8(body).unwrap().contains("/upload"));
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let (app, _dir) = test_app().await;
    let (status, _, _) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// ============================================================================
// Upload rejections
// ============================================================================

#[tokio::test]
async fn test_upload_not_multipart() {
    let (app, _dir) = test_app().await;
    let (status, body) = send_json(&app, post("/upload")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let (app, _dir) = test_app().await;
    let request = upload_request(multipart_body("notes", Some("data.csv"), VALID_CSV));
    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_upload_empty_file_name() {
    let (app, _dir) = test_app().await;
    let (status, body) = send_json(&app, upload_csv("", VALID_CSV)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file selected");
}

#[tokio::test]
async fn test_upload_wrong_extension() {
    let (app, _dir) = test_app().await;
    let (status, body) = send_json(&app, upload_csv("readings.xlsx", VALID_CSV)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid file type. Please upload a CSV file");
}

#[tokio::test]
async fn test_upload_empty_csv() {
    let (app, _dir) = test_app().await;
    let (status, body) = send_json(&app, upload_csv("empty.csv", EMPTY_CSV)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Error reading CSV file: No columns to parse from file");
}

#[tokio::test]
async fn test_upload_missing_longitude() {
    let (app, _dir) = test_app().await;
    let (status, body) = send_json(&app, upload_csv("data.csv", MISSING_LONGITUDE_CSV)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required columns: Longitude");
}

#[tokio::test]
async fn test_upload_no_gps_rows() {
    let (app, _dir) = test_app().await;
    let (status, body) = send_json(&app, upload_csv("data.csv", NO_GPS_CSV)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No valid data after removing missing GPS values");
}

#[tokio::test]
async fn test_upload_coordinates_only() {
    let (app, _dir) = test_app().await;
    let (status, body) = send_json(&app, upload_csv("data.csv", COORDINATES_ONLY_CSV)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "No measurement columns found (third column onward)"
    );
}

#[tokio::test]
async fn test_upload_all_columns_failing() {
    let (app, _dir) = test_app().await;
    let (status, body) = send_json(&app, upload_csv("data.csv", ALL_FAILING_CSV)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to create any heatmaps");

    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0]["column"], "A");
    assert_eq!(details[0]["error"], "No valid data for A");
    assert!(details[0].get("map_path").is_none());
}

#[tokio::test]
async fn test_backend_panic_becomes_server_error() {
    let dir = scratch_dir();
    let state = AppState::with_rasterizer(test_config(&dir), Arc::new(PanickingRasterizer), None)
        .await
        .unwrap();
    let app = build_router(Arc::new(state));

    let (status, body) = send_json(&app, upload_csv("data.csv", VALID_CSV)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "An error occurred: backend lost its renderer"
    );

    // The render lock is released, so the service keeps answering
    let (status, body) = send_json(&app, post("/clear")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

// ============================================================================
// Successful upload and artifacts
// ============================================================================

#[tokio::test]
async fn test_upload_renders_and_serves() {
    let (app, _dir) = test_app().await;
    let (status, body) = send_json(&app, upload_csv("readings.CSV", VALID_CSV)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["column"], "PM25");
    assert_eq!(results[0]["map_path"], "/static/heatmap_PM25.png");
    assert!(results[0].get("error").is_none());

    let (status, headers, png) = send(&app, get("/static/heatmap_PM25.png")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(image::load_from_memory(&png).unwrap().width(), 1280);
}

#[tokio::test]
async fn test_upload_bare_csv_name() {
    let (app, _dir) = test_app().await;
    let (status, body) = send_json(&app, upload_csv(".csv", VALID_CSV)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_partial_failure_is_success() {
    let (app, _dir) = test_app().await;
    let (status, body) = send_json(&app, upload_csv("data.csv", PARTIAL_FAILURE_CSV)).await;
    assert_eq!(status, StatusCode::OK);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["map_path"], "/static/heatmap_A.png");
    assert_eq!(results[1]["error"], "No valid data for B");
    assert_eq!(results[2]["error"], "C contains non-numeric values");
}

#[tokio::test]
async fn test_download_attachment() {
    let (app, _dir) = test_app().await;
    send_json(&app, upload_csv("data.csv", VALID_CSV)).await;

    let (status, headers, body) = send(&app, get("/download/heatmap_PM25.html")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"heatmap_PM25.html\""
    );
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(String::from_utf8(body).unwrap().contains("heatmap-description"));
}

#[tokio::test]
async fn test_download_missing() {
    let (app, _dir) = test_app().await;
    let (status, body) = send_json(&app, get("/download/heatmap_nope.png")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "File heatmap_nope.png not found");
}

#[tokio::test]
async fn test_download_rejects_traversal() {
    let (app, dir) = test_app().await;
    std::fs::write(dir.path().join("sub.png"), b"x").unwrap();

    let (status, _) = send_json(&app, get("/download/..%2Fsecret.txt")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send_json(&app, get("/download/nested/sub.png")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "File nested/sub.png not found");
}

#[tokio::test]
async fn test_clear_twice() {
    let (app, dir) = test_app().await;
    send_json(&app, upload_csv("data.csv", VALID_CSV)).await;

    let (status, body) = send_json(&app, post("/clear")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let deleted: Vec<String> = body["deleted"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert_eq!(deleted.len(), 4);
    assert!(deleted[0].ends_with("heatmap_PM25.png"));
    assert!(deleted[1].ends_with("heatmap_Temperature.png"));
    assert!(deleted[2].ends_with("heatmap_PM25.html"));
    assert!(deleted[3].ends_with("heatmap_Temperature.html"));
    assert!(deleted[0].starts_with(&dir.path().display().to_string()));

    let (status, body) = send_json(&app, post("/clear")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], serde_json::json!([]));
}
