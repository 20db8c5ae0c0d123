pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use lineup_avatar::{
    AssetResolver, AvatarPipeline, AvatarValidator, MemoryPlayerStore, Normalizer, PlayerStore,
};
use lineup_core::Config;
use lineup_storage::BackendRegistry;

use crate::state::AppState;

/// Wire up storage, pipeline, and routes from configuration.
pub async fn initialize_app(config: Config) -> Result<(AppState, Router)> {
    let registry = Arc::new(BackendRegistry::from_config(&config).await?);
    let players: Arc<dyn PlayerStore> = Arc::new(MemoryPlayerStore::new());

    let state = build_state(config, registry, players);
    let router = routes::build_router(state.clone());

    Ok((state, router))
}

/// Assemble application state from already constructed collaborators. Tests
/// use this directly to inject their own backends and player stores.
pub fn build_state(
    config: Config,
    registry: Arc<BackendRegistry>,
    players: Arc<dyn PlayerStore>,
) -> AppState {
    let pipeline = Arc::new(AvatarPipeline::new(
        registry.clone(),
        players.clone(),
        AvatarValidator::from_config(&config),
        Normalizer::new(config.avatar_target_dim),
    ));
    let resolver = Arc::new(AssetResolver::new(registry.clone(), players.clone()));

    AppState {
        config,
        registry,
        players,
        pipeline,
        resolver,
    }
}
