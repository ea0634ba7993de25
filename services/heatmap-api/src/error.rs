//! HTTP error responses.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ingestion::TableError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::pipeline::ColumnResult;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Upload rejected before any rendering
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("File {0} not found")]
    NotFound(String),

    #[error("Failed to create any heatmaps")]
    AllFailed(Vec<ColumnResult>),

    #[error("Error serving file: {0}")]
    Serve(String),

    #[error("Failed to clear files: {0}")]
    Clear(String),

    #[error("An error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Table(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AllFailed(_)
            | ApiError::Serve(_)
            | ApiError::Clear(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::AllFailed(details) => json!({
                "error": self.to_string(),
                "details": details,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Response for a request whose handler panicked.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown failure".to_string()
    };
    error!(error = %detail, "Request handler panicked");
    ApiError::Internal(detail).into_response()
}
