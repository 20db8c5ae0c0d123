use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use lineup_core::{AssetRef, Player};
use lineup_storage::{BackendRegistry, StorageError, StoreHint};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::players::{PlayerStore, PlayerStoreError};
use crate::temp::TempUpload;
use crate::transform::{Normalizer, TransformError, CANONICAL_EXTENSION};
use crate::validator::{AvatarValidator, ValidationError};

/// An uploaded file staged on disk, with the metadata validation needs.
pub struct StagedUpload {
    pub temp: TempUpload,
    pub content_type: Option<String>,
    pub size_bytes: u64,
}

/// Raw avatar submission as it arrives from the transport layer, before any
/// validation has run.
pub struct UploadSubmission {
    pub player_id: String,
    pub file: Option<StagedUpload>,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Player not found: {0}")]
    PlayerNotFound(Uuid),
    #[error("Avatar pipeline failure: {0}")]
    Internal(String),
}

/// Orchestrates an avatar replacement end to end: validate, normalize, store
/// the new asset, link it to the player, then purge the superseded asset.
///
/// Ordering rules:
/// - The new asset is fully stored before the player record changes, and the
///   old asset is only deleted after the link succeeds. A crash mid-run can
///   leave an orphaned object but never a player pointing at missing bytes.
/// - A purge failure is logged and swallowed; the replacement already
///   succeeded from the caller's point of view.
/// - The staged upload file is removed on every exit path.
///
/// Store, link, and purge run under a per-player lock so concurrent uploads
/// for the same player cannot interleave and strand each other's assets.
pub struct AvatarPipeline {
    registry: Arc<BackendRegistry>,
    players: Arc<dyn PlayerStore>,
    validator: AvatarValidator,
    normalizer: Normalizer,
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl AvatarPipeline {
    pub fn new(
        registry: Arc<BackendRegistry>,
        players: Arc<dyn PlayerStore>,
        validator: AvatarValidator,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            registry,
            players,
            validator,
            normalizer,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replace a player's avatar with the submitted image.
    pub async fn replace_avatar(
        &self,
        submission: UploadSubmission,
    ) -> Result<Player, PipelineError> {
        let result = self.run(&submission).await;

        // Success or failure, the staged file does not outlive the request.
        if let Some(file) = submission.file {
            file.temp.remove().await;
        }

        result
    }

    async fn run(&self, submission: &UploadSubmission) -> Result<Player, PipelineError> {
        let start = Instant::now();
        let player_id = self.validator.validate(submission)?;
        let file = submission
            .file
            .as_ref()
            .ok_or(ValidationError::MissingFile)?;

        let data = file
            .temp
            .read()
            .await
            .map_err(|e| PipelineError::Internal(format!("Failed to read staged upload: {}", e)))?;

        let normalizer = self.normalizer;
        let normalized = tokio::task::spawn_blocking(move || normalizer.normalize(&data))
            .await
            .map_err(|e| PipelineError::Internal(format!("Normalize task panicked: {}", e)))??;

        let lock = self.entity_lock(player_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.store_and_link(player_id, normalized).await
        };
        drop(lock);
        self.release_entity_lock(player_id).await;
        let player = result?;

        tracing::info!(
            player_id = %player_id,
            backend = player.avatar.as_ref().map_or("none", |a| a.backend_id.as_str()),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Avatar replaced"
        );

        Ok(player)
    }

    /// The locked section: store the new asset, swap the link, purge the old
    /// one. Callers must hold the player's entity lock.
    async fn store_and_link(
        &self,
        player_id: Uuid,
        normalized: Vec<u8>,
    ) -> Result<Player, PipelineError> {
        let backend = self.registry.default_backend();
        let hint = StoreHint::new(player_id, CANONICAL_EXTENSION);
        let new_ref = backend.store(normalized, &hint).await?;

        let (player, previous) = match self
            .players
            .swap_avatar(player_id, Some(new_ref.clone()))
            .await
        {
            Ok(linked) => linked,
            Err(e) => {
                // Linking failed after the bytes landed; take the new asset
                // back out so it does not leak.
                self.purge(&new_ref).await;
                return Err(match e {
                    PlayerStoreError::NotFound(id) => PipelineError::PlayerNotFound(id),
                    PlayerStoreError::Internal(msg) => PipelineError::Internal(msg),
                });
            }
        };

        if let Some(old_ref) = previous {
            self.purge(&old_ref).await;
        }

        Ok(player)
    }

    /// Best-effort asset deletion. Failures are logged, never propagated.
    async fn purge(&self, reference: &AssetRef) {
        let backend = match self.registry.resolve(&reference.backend_id) {
            Ok(backend) => backend,
            Err(e) => {
                tracing::error!(
                    backend = %reference.backend_id,
                    location = %reference.location,
                    error = %e,
                    "Cannot purge asset: backend not registered"
                );
                return;
            }
        };

        if let Err(e) = backend.delete(reference).await {
            tracing::error!(
                backend = %reference.backend_id,
                location = %reference.location,
                error = %e,
                "Failed to purge superseded asset"
            );
        }
    }

    async fn entity_lock(&self, player_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(player_id)
            .or_default()
            .clone()
    }

    /// Drop the map entry once no upload holds the lock anymore, so the map
    /// does not accumulate one entry per player id ever seen.
    async fn release_entity_lock(&self, player_id: Uuid) {
        let mut locks = self.locks.lock().await;
        if let Some(entry) = locks.get(&player_id) {
            if Arc::strong_count(entry) == 1 {
                locks.remove(&player_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::players::MemoryPlayerStore;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use lineup_storage::{AssetBackend, MemoryBackend, StorageResult};
    use std::io::Cursor;

    struct FailingBackend {
        id: &'static str,
        fail_store: bool,
        fail_delete: bool,
    }

    #[async_trait]
    impl AssetBackend for FailingBackend {
        fn backend_id(&self) -> &str {
            self.id
        }

        async fn store(&self, _data: Vec<u8>, hint: &StoreHint) -> StorageResult<AssetRef> {
            if self.fail_store {
                return Err(StorageError::Write("synthetic store failure".to_string()));
            }
            Ok(AssetRef::new(
                format!("{}://{}/{}", self.id, hint.player_id, "asset"),
                self.id,
            ))
        }

        async fn fetch(&self, _reference: &AssetRef) -> StorageResult<Vec<u8>> {
            Err(StorageError::Read("synthetic read failure".to_string()))
        }

        async fn delete(&self, _reference: &AssetRef) -> StorageResult<()> {
            if self.fail_delete {
                return Err(StorageError::Write("synthetic delete failure".to_string()));
            }
            Ok(())
        }

        fn is_time_limited(&self) -> bool {
            false
        }

        async fn refresh_url(&self, reference: &AssetRef) -> StorageResult<String> {
            Ok(reference.location.clone())
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(64, 64));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    async fn submission(
        dir: &tempfile::TempDir,
        player_id: &str,
        data: &[u8],
    ) -> UploadSubmission {
        UploadSubmission {
            player_id: player_id.to_string(),
            file: Some(StagedUpload {
                temp: TempUpload::stage(dir.path(), data).await.unwrap(),
                content_type: Some("image/png".to_string()),
                size_bytes: data.len() as u64,
            }),
        }
    }

    fn pipeline_with(
        backends: Vec<Arc<dyn AssetBackend>>,
        default_id: &str,
        players: Arc<dyn PlayerStore>,
    ) -> AvatarPipeline {
        let registry = Arc::new(BackendRegistry::new(backends, default_id).unwrap());
        AvatarPipeline::new(
            registry,
            players,
            AvatarValidator::default(),
            Normalizer::new(64),
        )
    }

    #[tokio::test]
    async fn first_upload_stores_and_links() {
        let dir = tempfile::tempdir().unwrap();
        let memory = Arc::new(MemoryBackend::new());
        let players: Arc<dyn PlayerStore> = Arc::new(MemoryPlayerStore::new());
        let player = players.create("Ada").await.unwrap();
        let pipeline = pipeline_with(vec![memory.clone()], "memory", players);

        let sub = submission(&dir, &player.id.to_string(), &png_bytes()).await;
        let updated = pipeline.replace_avatar(sub).await.unwrap();

        let avatar = updated.avatar.unwrap();
        assert_eq!(avatar.backend_id, "memory");
        assert_eq!(memory.object_count(), 1);
    }

    #[tokio::test]
    async fn entity_locks_do_not_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let memory = Arc::new(MemoryBackend::new());
        let players: Arc<dyn PlayerStore> = Arc::new(MemoryPlayerStore::new());
        let pipeline = pipeline_with(vec![memory], "memory", players.clone());

        for _ in 0..3 {
            let player = players.create("Ada").await.unwrap();
            let sub = submission(&dir, &player.id.to_string(), &png_bytes()).await;
            pipeline.replace_avatar(sub).await.unwrap();
        }

        assert!(pipeline.locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn replacement_purges_previous_asset() {
        let dir = tempfile::tempdir().unwrap();
        let memory = Arc::new(MemoryBackend::new());
        let players: Arc<dyn PlayerStore> = Arc::new(MemoryPlayerStore::new());
        let player = players.create("Ada").await.unwrap();
        let pipeline = pipeline_with(vec![memory.clone()], "memory", players);

        let first = submission(&dir, &player.id.to_string(), &png_bytes()).await;
        let after_first = pipeline.replace_avatar(first).await.unwrap();
        let first_location = after_first.avatar.unwrap().location;

        let second = submission(&dir, &player.id.to_string(), &png_bytes()).await;
        let after_second = pipeline.replace_avatar(second).await.unwrap();

        assert_ne!(after_second.avatar.unwrap().location, first_location);
        // The superseded object is gone; only the current one remains.
        assert_eq!(memory.object_count(), 1);
    }

    #[tokio::test]
    async fn store_failure_leaves_player_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let players: Arc<dyn PlayerStore> = Arc::new(MemoryPlayerStore::new());
        let player = players.create("Ada").await.unwrap();
        let pipeline = pipeline_with(
            vec![Arc::new(FailingBackend {
                id: "memory",
                fail_store: true,
                fail_delete: false,
            })],
            "memory",
            players.clone(),
        );

        let sub = submission(&dir, &player.id.to_string(), &png_bytes()).await;
        let temp_path = sub.file.as_ref().unwrap().temp.path().to_path_buf();

        let err = pipeline.replace_avatar(sub).await;
        assert!(matches!(err, Err(PipelineError::Storage(_))));

        assert!(players.get(player.id).await.unwrap().avatar.is_none());
        assert!(!temp_path.exists());
    }

    #[tokio::test]
    async fn link_failure_purges_new_asset() {
        let dir = tempfile::tempdir().unwrap();
        let memory = Arc::new(MemoryBackend::new());
        let players: Arc<dyn PlayerStore> = Arc::new(MemoryPlayerStore::new());
        let pipeline = pipeline_with(vec![memory.clone()], "memory", players);

        // Well-formed id that no player record carries.
        let sub = submission(&dir, &Uuid::new_v4().to_string(), &png_bytes()).await;
        let err = pipeline.replace_avatar(sub).await;

        assert!(matches!(err, Err(PipelineError::PlayerNotFound(_))));
        assert_eq!(memory.object_count(), 0);
    }

    #[tokio::test]
    async fn purge_failure_is_non_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let memory = Arc::new(MemoryBackend::new());
        let players: Arc<dyn PlayerStore> = Arc::new(MemoryPlayerStore::new());
        let player = players.create("Ada").await.unwrap();
        players
            .swap_avatar(player.id, Some(AssetRef::new("flaky://old", "flaky")))
            .await
            .unwrap();

        let pipeline = pipeline_with(
            vec![
                memory.clone(),
                Arc::new(FailingBackend {
                    id: "flaky",
                    fail_store: false,
                    fail_delete: true,
                }),
            ],
            "memory",
            players.clone(),
        );

        let sub = submission(&dir, &player.id.to_string(), &png_bytes()).await;
        let updated = pipeline.replace_avatar(sub).await.unwrap();

        assert_eq!(updated.avatar.unwrap().backend_id, "memory");
        assert_eq!(memory.object_count(), 1);
    }

    #[tokio::test]
    async fn purge_with_unregistered_backend_is_non_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let memory = Arc::new(MemoryBackend::new());
        let players: Arc<dyn PlayerStore> = Arc::new(MemoryPlayerStore::new());
        let player = players.create("Ada").await.unwrap();
        players
            .swap_avatar(player.id, Some(AssetRef::new("ghost://old", "ghost")))
            .await
            .unwrap();

        let pipeline = pipeline_with(vec![memory.clone()], "memory", players.clone());

        let sub = submission(&dir, &player.id.to_string(), &png_bytes()).await;
        let updated = pipeline.replace_avatar(sub).await.unwrap();
        assert_eq!(updated.avatar.unwrap().backend_id, "memory");
    }

    #[tokio::test]
    async fn validation_failure_cleans_temp() {
        let dir = tempfile::tempdir().unwrap();
        let memory: Arc<dyn AssetBackend> = Arc::new(MemoryBackend::new());
        let players: Arc<dyn PlayerStore> = Arc::new(MemoryPlayerStore::new());
        let pipeline = pipeline_with(vec![memory], "memory", players);

        let sub = submission(&dir, "not-a-uuid", &png_bytes()).await;
        let temp_path = sub.file.as_ref().unwrap().temp.path().to_path_buf();

        let err = pipeline.replace_avatar(sub).await;
        assert!(matches!(
            err,
            Err(PipelineError::Validation(ValidationError::InvalidPlayerId(_)))
        ));
        assert!(!temp_path.exists());
    }

    #[tokio::test]
    async fn corrupt_image_cleans_temp_and_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let memory = Arc::new(MemoryBackend::new());
        let players: Arc<dyn PlayerStore> = Arc::new(MemoryPlayerStore::new());
        let player = players.create("Ada").await.unwrap();
        let pipeline = pipeline_with(vec![memory.clone()], "memory", players);

        let sub = submission(&dir, &player.id.to_string(), b"not an image").await;
        let temp_path = sub.file.as_ref().unwrap().temp.path().to_path_buf();

        let err = pipeline.replace_avatar(sub).await;
        assert!(matches!(err, Err(PipelineError::Transform(_))));
        assert_eq!(memory.object_count(), 0);
        assert!(!temp_path.exists());
    }
}
