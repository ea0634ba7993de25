//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Extension, Multipart, Path},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use ingestion::{detect_file_type, FileType, ObservationTable};
use serde_json::{json, Value};
use storage::content_type_for;
use tracing::{debug, error, info, instrument, warn};

use crate::error::ApiError;
use crate::metrics::{record_clear, record_upload};
use crate::pipeline::PipelineError;
use crate::state::AppState;

/// Multipart field carrying the CSV.
const UPLOAD_FIELD: &str = "file";

const INDEX_HTML: &str = include_str!("../static/index.html");

// ============================================================================
// Upload
// ============================================================================

/// A file part pulled from the upload form.
#[derive(Debug)]
struct UploadedFile {
    file_name: String,
    contents: Bytes,
}

/// Find the `file` part. Parts without a file name are plain form fields
/// and do not count as an upload.
async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> Result<UploadedFile, ApiError> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!(error = %rejection, "Request is not multipart");
            return Err(ApiError::BadRequest("No file uploaded".to_string()));
        }
    };

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Error reading CSV file: {}", e)))?;
        let Some(field) = field else {
            return Err(ApiError::BadRequest("No file uploaded".to_string()));
        };

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let contents = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Error reading CSV file: {}", e)))?;

        return Ok(UploadedFile {
            file_name,
            contents,
        });
    }
}

/// POST /upload - Render a heatmap per measurement column of a CSV
#[instrument(skip_all)]
pub async fn upload_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let response = match process_upload(&state, multipart).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            if e.status().is_server_error() {
                error!(error = %e, "Upload failed");
            } else {
                warn!(error = %e, "Upload rejected");
            }
            e.into_response()
        }
    };
    record_upload(response.status().as_u16());
    response
}

async fn process_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Value, ApiError> {
    let upload = read_upload(multipart).await?;
    if upload.file_name.is_empty() {
        return Err(ApiError::BadRequest("No file selected".to_string()));
    }
    if detect_file_type(&upload.file_name) != FileType::Csv {
        return Err(ApiError::BadRequest(
            "Invalid file type. Please upload a CSV file".to_string(),
        ));
    }
    info!(file = %upload.file_name, bytes = upload.contents.len(), "Received upload");

    let table = ObservationTable::from_bytes(&upload.contents)?.validate()?;
    debug!(
        columns = ?table.measurement_columns(),
        rows = table.row_count(),
        "Measurement columns"
    );

    let _guard = state.render_lock.lock().await;
    match state.pipeline.run(&table).await {
        Ok(results) => Ok(json!({ "success": true, "results": results })),
        Err(PipelineError::AllFailed(details)) => Err(ApiError::AllFailed(details)),
    }
}

// ============================================================================
// Artifacts
// ============================================================================

/// GET /download/*filename - Serve an artifact as an attachment
#[instrument(skip(state))]
pub async fn download_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let Some(path) = state.store.resolve(&filename).await else {
        warn!(file = %filename, "File not found");
        return Err(ApiError::NotFound(filename));
    };

    let contents = tokio::fs::read(&path).await.map_err(|e| {
        error!(path = %path.display(), error = %e, "Download failed");
        ApiError::Serve(e.to_string())
    })?;
    info!(path = %path.display(), "Serving file");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type_for(&filename).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        contents,
    )
        .into_response())
}

/// POST /clear - Delete every generated artifact
#[instrument(skip(state))]
pub async fn clear_handler(Extension(state): Extension<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let _guard = state.render_lock.lock().await;
    let deleted = state.store.clear().await.map_err(|e| {
        error!(error = %e, "Clear failed");
        ApiError::Clear(e.to_string())
    })?;

    record_clear(deleted.len());
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

// ============================================================================
// Pages and monitoring
// ============================================================================

/// GET / - Upload page
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health - Basic health check
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus metrics endpoint
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "Metrics recorder not installed").into_response(),
    }
}
