use std::path::Path as FsPath;

use axum::extract::{Multipart, Path, State};
use axum::Json;
use lineup_avatar::{StagedUpload, TempUpload, UploadSubmission};

use crate::error::{ApiError, ErrorResponse};
use crate::handlers::players::PlayerResponse;
use crate::state::AppState;

/// Upload a new avatar for a player
///
/// Accepts a multipart form with a single `file` part. The pipeline validates,
/// normalizes, and stores the image, then atomically swaps it in for any
/// previous avatar.
#[utoipa::path(
    post,
    path = "/api/v0/players/{id}/avatar",
    tag = "players",
    params(("id" = String, Path, description = "Player id")),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Avatar replaced", body = PlayerResponse),
        (status = 400, description = "Invalid upload", body = ErrorResponse),
        (status = 404, description = "Player not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn upload_avatar(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<PlayerResponse>, ApiError> {
    let mut file: Option<StagedUpload> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().map(|ct| ct.to_string());
        let data = field.bytes().await?;

        let temp = TempUpload::stage(FsPath::new(&state.config.spool_dir), &data)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to spool upload: {}", e)))?;

        file = Some(StagedUpload {
            temp,
            content_type,
            size_bytes: data.len() as u64,
        });
        break;
    }

    let submission = UploadSubmission { player_id, file };
    let player = state.pipeline.replace_avatar(submission).await?;

    // Resolve so the response carries a usable URL straight away.
    let location = state.resolver.resolve(&player).await?;

    Ok(Json(PlayerResponse::from_player(&state, player, location)))
}
