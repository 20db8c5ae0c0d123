use std::sync::Arc;

use lineup_core::Player;
use lineup_storage::{BackendRegistry, StorageError, StorageResult};

use crate::players::PlayerStore;

/// Turns a stored avatar reference into a currently usable URL.
///
/// Backends with time-limited locations are asked to re-sign on every read;
/// the refreshed location is written back to the player record so later reads
/// start from a newer URL, but a write-back failure never fails the read.
pub struct AssetResolver {
    registry: Arc<BackendRegistry>,
    players: Arc<dyn PlayerStore>,
}

impl AssetResolver {
    pub fn new(registry: Arc<BackendRegistry>, players: Arc<dyn PlayerStore>) -> Self {
        Self { registry, players }
    }

    /// Resolve the player's avatar to a usable URL, if they have one.
    ///
    /// Fails with `StorageError::UnknownBackend` when the stored reference
    /// names a backend this process does not have; callers decide whether that
    /// degrades the response or fails it.
    pub async fn resolve(&self, player: &Player) -> StorageResult<Option<String>> {
        let Some(ref avatar) = player.avatar else {
            return Ok(None);
        };

        let backend = self.registry.resolve(&avatar.backend_id)?;

        if !backend.is_time_limited() {
            return Ok(Some(avatar.location.clone()));
        }

        let fresh = backend.refresh_url(avatar).await?;

        if fresh != avatar.location {
            if let Err(e) = self
                .players
                .set_avatar_location(player.id, &avatar.location, fresh.clone())
                .await
            {
                tracing::warn!(
                    player_id = %player.id,
                    error = %e,
                    "Failed to persist refreshed avatar location"
                );
            }
        }

        Ok(Some(fresh))
    }
}
