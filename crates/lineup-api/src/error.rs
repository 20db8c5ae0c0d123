//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, ApiError>`; every error renders
//! as the same JSON shape with a machine-readable code and a recoverable flag.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lineup_avatar::{PipelineError, PlayerStoreError, TransformError, ValidationError};
use lineup_storage::StorageError;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    PlayerStore(#[from] PlayerStoreError),
    #[error("Invalid multipart request: {0}")]
    Multipart(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Multipart(e.to_string())
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, bool) {
        match self {
            ApiError::Pipeline(PipelineError::Validation(ValidationError::FileTooLarge {
                ..
            })) => (StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE", false),
            ApiError::Pipeline(PipelineError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_UPLOAD", false)
            }
            ApiError::Pipeline(PipelineError::Transform(TransformError::UnsupportedImage(_))) => {
                (StatusCode::BAD_REQUEST, "UNSUPPORTED_IMAGE", false)
            }
            ApiError::Pipeline(PipelineError::Transform(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "TRANSFORM_FAILED", true)
            }
            ApiError::Pipeline(PipelineError::PlayerNotFound(_)) => {
                (StatusCode::NOT_FOUND, "PLAYER_NOT_FOUND", false)
            }
            ApiError::Pipeline(PipelineError::Storage(_)) | ApiError::Storage(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILURE", true)
            }
            ApiError::Pipeline(PipelineError::Internal(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", true)
            }
            ApiError::PlayerStore(PlayerStoreError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "PLAYER_NOT_FOUND", false)
            }
            ApiError::PlayerStore(PlayerStoreError::Internal(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", true)
            }
            ApiError::Multipart(_) | ApiError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", false)
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", true),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, recoverable) = self.parts();

        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        } else {
            tracing::debug!(error = %self, code, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            recoverable,
        };

        (status, Json(body)).into_response()
    }
}
