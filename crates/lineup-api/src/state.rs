//! Application state shared by all handlers.

use std::sync::Arc;

use lineup_avatar::{AssetResolver, AvatarPipeline, PlayerStore};
use lineup_core::Config;
use lineup_storage::BackendRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: Arc<BackendRegistry>,
    pub players: Arc<dyn PlayerStore>,
    pub pipeline: Arc<AvatarPipeline>,
    pub resolver: Arc<AssetResolver>,
}
