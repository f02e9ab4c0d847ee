//! Mapping of request and fetch failures to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use history_atlas_assembly::FetchError;
use serde::Serialize;
use std::time::Duration;
use tracing::error;

/// Error returned by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed query or path parameter; the store is never contacted.
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The request did not finish within the configured deadline.
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Fetch(err) => {
                error!("Fetch failed: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Timeout(limit) => {
                error!("Request exceeded deadline of {:?}", limit);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
