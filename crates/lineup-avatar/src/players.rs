use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use lineup_core::{AssetRef, Player};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PlayerStoreError {
    #[error("Player not found: {0}")]
    NotFound(Uuid),
    #[error("Player store failure: {0}")]
    Internal(String),
}

/// Persistence seam for player entities.
///
/// The pipeline only needs these four operations; anything backed by a real
/// database implements them behind this trait.
#[async_trait]
pub trait PlayerStore: Send + Sync {
    async fn create(&self, name: &str) -> Result<Player, PlayerStoreError>;

    async fn get(&self, id: Uuid) -> Result<Player, PlayerStoreError>;

    /// Atomically replace the player's avatar reference, returning the updated
    /// player together with whatever reference it previously held.
    async fn swap_avatar(
        &self,
        id: Uuid,
        avatar: Option<AssetRef>,
    ) -> Result<(Player, Option<AssetRef>), PlayerStoreError>;

    /// Overwrite only the stored location of the current avatar, keeping the
    /// backend id. Used when a time-limited URL has been refreshed. The write
    /// only happens while the current location still equals `previous`; a
    /// write-back computed from a stale snapshot is silently skipped so it
    /// cannot clobber an avatar swapped in since.
    async fn set_avatar_location(
        &self,
        id: Uuid,
        previous: &str,
        location: String,
    ) -> Result<(), PlayerStoreError>;
}

/// In-memory store used by the default deployment and the test suite.
#[derive(Default)]
pub struct MemoryPlayerStore {
    players: RwLock<HashMap<Uuid, Player>>,
}

impl MemoryPlayerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlayerStore for MemoryPlayerStore {
    async fn create(&self, name: &str) -> Result<Player, PlayerStoreError> {
        let player = Player::new(name);
        self.players
            .write()
            .await
            .insert(player.id, player.clone());
        Ok(player)
    }

    async fn get(&self, id: Uuid) -> Result<Player, PlayerStoreError> {
        self.players
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(PlayerStoreError::NotFound(id))
    }

    async fn swap_avatar(
        &self,
        id: Uuid,
        avatar: Option<AssetRef>,
    ) -> Result<(Player, Option<AssetRef>), PlayerStoreError> {
        let mut players = self.players.write().await;
        let player = players.get_mut(&id).ok_or(PlayerStoreError::NotFound(id))?;

        let previous = std::mem::replace(&mut player.avatar, avatar);
        player.updated_at = Utc::now();

        Ok((player.clone(), previous))
    }

    async fn set_avatar_location(
        &self,
        id: Uuid,
        previous: &str,
        location: String,
    ) -> Result<(), PlayerStoreError> {
        let mut players = self.players.write().await;
        let player = players.get_mut(&id).ok_or(PlayerStoreError::NotFound(id))?;

        if let Some(ref mut avatar) = player.avatar {
            if avatar.location == previous {
                avatar.location = location;
                player.updated_at = Utc::now();
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_get() {
        let store = MemoryPlayerStore::new();
        let player = store.create("Ada").await.unwrap();
        let fetched = store.get(player.id).await.unwrap();
        assert_eq!(fetched.name, "Ada");
        assert!(fetched.avatar.is_none());
    }

    #[tokio::test]
    async fn get_unknown_is_not_found() {
        let store = MemoryPlayerStore::new();
        assert!(matches!(
            store.get(Uuid::new_v4()).await,
            Err(PlayerStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn swap_returns_previous_reference() {
        let store = MemoryPlayerStore::new();
        let player = store.create("Ada").await.unwrap();

        let first = AssetRef::new("memory://a", "memory");
        let (updated, previous) = store
            .swap_avatar(player.id, Some(first.clone()))
            .await
            .unwrap();
        assert!(previous.is_none());
        assert_eq!(updated.avatar.as_ref().unwrap().location, "memory://a");

        let second = AssetRef::new("memory://b", "memory");
        let (_, previous) = store.swap_avatar(player.id, Some(second)).await.unwrap();
        assert_eq!(previous.unwrap().location, first.location);
    }

    #[tokio::test]
    async fn swap_on_unknown_player_is_not_found() {
        let store = MemoryPlayerStore::new();
        let asset = AssetRef::new("memory://a", "memory");
        assert!(matches!(
            store.swap_avatar(Uuid::new_v4(), Some(asset)).await,
            Err(PlayerStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn set_avatar_location_keeps_backend_id() {
        let store = MemoryPlayerStore::new();
        let player = store.create("Ada").await.unwrap();
        store
            .swap_avatar(player.id, Some(AssetRef::new("memory://a?sig=0", "memory")))
            .await
            .unwrap();

        store
            .set_avatar_location(player.id, "memory://a?sig=0", "memory://a?sig=1".to_string())
            .await
            .unwrap();

        let fetched = store.get(player.id).await.unwrap();
        let avatar = fetched.avatar.unwrap();
        assert_eq!(avatar.location, "memory://a?sig=1");
        assert_eq!(avatar.backend_id, "memory");
    }

    #[tokio::test]
    async fn stale_location_write_back_is_skipped() {
        let store = MemoryPlayerStore::new();
        let player = store.create("Ada").await.unwrap();
        store
            .swap_avatar(player.id, Some(AssetRef::new("memory://a?sig=0", "memory")))
            .await
            .unwrap();

        // The avatar is replaced while a reader still holds the old snapshot.
        store
            .swap_avatar(player.id, Some(AssetRef::new("memory://b?sig=0", "memory")))
            .await
            .unwrap();

        // The reader's refresh of the old location must not clobber the new one.
        store
            .set_avatar_location(player.id, "memory://a?sig=0", "memory://a?sig=1".to_string())
            .await
            .unwrap();

        let fetched = store.get(player.id).await.unwrap();
        assert_eq!(fetched.avatar.unwrap().location, "memory://b?sig=0");
    }
}
