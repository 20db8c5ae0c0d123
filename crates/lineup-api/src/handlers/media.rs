use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use lineup_core::AssetRef;
use lineup_storage::StorageError;

use crate::error::ApiError;
use crate::state::AppState;

/// Serve a locally stored asset by key.
///
/// Only the local backend stores relative keys; S3 references are absolute
/// presigned URLs and never route through here.
pub async fn serve_media(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let backend = match state.registry.resolve("local") {
        Ok(backend) => backend,
        Err(StorageError::UnknownBackend(_)) => {
            return Ok(StatusCode::NOT_FOUND.into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let reference = AssetRef::new(key, "local");
    let data = match backend.fetch(&reference).await {
        Ok(data) => data,
        Err(StorageError::Read(_)) | Err(StorageError::InvalidLocation(_)) => {
            return Ok(StatusCode::NOT_FOUND.into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let content_type = content_type_for(&reference.location);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            // Keys are unique per asset, so cached responses never go stale.
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        data,
    )
        .into_response())
}

fn content_type_for(key: &str) -> &'static str {
    match key.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
