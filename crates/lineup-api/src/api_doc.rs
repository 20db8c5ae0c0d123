//! OpenAPI document.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers;
use crate::handlers::players::{CreatePlayerRequest, PlayerResponse};
use lineup_core::AssetRef;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lineup API",
        description = "Player profiles with pluggable avatar storage"
    ),
    paths(
        handlers::players::create_player,
        handlers::players::get_player,
        handlers::avatar::upload_avatar,
    ),
    components(schemas(CreatePlayerRequest, PlayerResponse, ErrorResponse, AssetRef)),
    tags(
        (name = "players", description = "Player and avatar management")
    )
)]
pub struct ApiDoc;
