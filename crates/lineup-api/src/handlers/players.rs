use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use lineup_core::Player;
use lineup_storage::StorageError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePlayerRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerResponse {
    pub id: Uuid,
    pub name: String,
    /// Currently usable avatar URL, refreshed for time-limited backends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlayerResponse {
    pub fn from_player(state: &AppState, player: Player, location: Option<String>) -> Self {
        let avatar_url = location.map(|loc| public_url(state, &player, loc));
        Self {
            id: player.id,
            name: player.name,
            avatar_url,
            created_at: player.created_at,
            updated_at: player.updated_at,
        }
    }
}

/// Local backend locations are relative keys under the media route; every
/// other backend already hands out absolute URLs.
fn public_url(state: &AppState, player: &Player, location: String) -> String {
    let is_local = player
        .avatar
        .as_ref()
        .is_some_and(|a| a.backend_id == "local");
    if is_local {
        let base = state
            .config
            .local_storage_base_url
            .as_deref()
            .unwrap_or("")
            .trim_end_matches('/')
            .to_string();
        format!("{}/media/{}", base, location)
    } else {
        location
    }
}

/// Create a player
#[utoipa::path(
    post,
    path = "/api/v0/players",
    tag = "players",
    request_body = CreatePlayerRequest,
    responses(
        (status = 201, description = "Player created", body = PlayerResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
pub async fn create_player(
    State(state): State<AppState>,
    Json(request): Json<CreatePlayerRequest>,
) -> Result<(StatusCode, Json<PlayerResponse>), ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Player name is required".to_string()));
    }

    let player = state.players.create(name).await?;
    tracing::info!(player_id = %player.id, "Player created");

    Ok((
        StatusCode::CREATED,
        Json(PlayerResponse::from_player(&state, player, None)),
    ))
}

/// Fetch a player with a resolved avatar URL
#[utoipa::path(
    get,
    path = "/api/v0/players/{id}",
    tag = "players",
    params(("id" = Uuid, Path, description = "Player id")),
    responses(
        (status = 200, description = "Player found", body = PlayerResponse),
        (status = 404, description = "Player not found", body = ErrorResponse)
    )
)]
pub async fn get_player(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerResponse>, ApiError> {
    let player = state.players.get(id).await?;

    let location = match state.resolver.resolve(&player).await {
        Ok(location) => location,
        // A reference naming a backend this deployment no longer has is a
        // data problem, not the reader's; degrade to no avatar instead of
        // failing the whole read.
        Err(StorageError::UnknownBackend(backend_id)) => {
            tracing::error!(
                player_id = %player.id,
                backend = %backend_id,
                "Avatar references unregistered backend"
            );
            None
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(PlayerResponse::from_player(&state, player, location)))
}
