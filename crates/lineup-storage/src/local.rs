use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lineup_core::{AssetRef, BackendKind};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::keys;
use crate::traits::{AssetBackend, StorageError, StorageResult, StoreHint};

/// Local filesystem backend.
///
/// Locations are relative keys under the managed root, never time-limited; the
/// api layer serves them through its media route.
#[derive(Clone)]
pub struct LocalBackend {
    base_path: PathBuf,
}

impl LocalBackend {
    /// Create a new `LocalBackend` rooted at `base_path`, creating the
    /// directory if needed.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::Config(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalBackend { base_path })
    }

    /// Convert a storage key to a filesystem path, rejecting keys that could
    /// escape the managed root.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.contains("..") || key.starts_with('/') || key.contains('\\') {
            return Err(StorageError::InvalidLocation(format!(
                "Key escapes storage root: {}",
                key
            )));
        }
        Ok(self.base_path.join(key))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Write(format!("Failed to create directory: {}", e)))?;
        }
        Ok(())
    }
}

#[async_trait]
impl AssetBackend for LocalBackend {
    fn backend_id(&self) -> &str {
        BackendKind::Local.id()
    }

    async fn store(&self, data: Vec<u8>, hint: &StoreHint) -> StorageResult<AssetRef> {
        let key = keys::avatar_key(hint);
        let path = self.key_to_path(&key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::Write(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::Write(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::Write(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage store successful"
        );

        Ok(AssetRef::new(key, self.backend_id()))
    }

    async fn fetch(&self, reference: &AssetRef) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(&reference.location)?;

        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::Read(
                format!("Object not found: {}", reference.location),
            )),
            Err(e) => Err(StorageError::Read(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn delete(&self, reference: &AssetRef) -> StorageResult<()> {
        let path = self.key_to_path(&reference.location)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(key = %reference.location, "Local storage delete successful");
                Ok(())
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Write(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn is_time_limited(&self) -> bool {
        false
    }

    async fn refresh_url(&self, reference: &AssetRef) -> StorageResult<String> {
        // Local keys do not expire; validate and hand the location back.
        self.key_to_path(&reference.location)?;
        Ok(reference.location.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use uuid::Uuid;

    #[tokio::test]
    async fn store_then_fetch_round_trips() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::new(dir.path()).await.unwrap();

        let hint = StoreHint::new(Uuid::new_v4(), "png");
        let data = b"avatar bytes".to_vec();
        let asset = backend.store(data.clone(), &hint).await.unwrap();

        assert_eq!(asset.backend_id, "local");
        assert!(asset.location.starts_with("avatars/"));

        let fetched = backend.fetch(&asset).await.unwrap();
        assert_eq!(fetched, data);
    }

    #[tokio::test]
    async fn refresh_url_is_identity() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::new(dir.path()).await.unwrap();

        let hint = StoreHint::new(Uuid::new_v4(), "png");
        let asset = backend.store(b"x".to_vec(), &hint).await.unwrap();

        assert!(!backend.is_time_limited());
        let url = backend.refresh_url(&asset).await.unwrap();
        assert_eq!(url, asset.location);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::new(dir.path()).await.unwrap();

        let hint = StoreHint::new(Uuid::new_v4(), "png");
        let asset = backend.store(b"x".to_vec(), &hint).await.unwrap();

        backend.delete(&asset).await.unwrap();
        assert!(backend.fetch(&asset).await.is_err());
        // Second delete of the same reference must also succeed.
        backend.delete(&asset).await.unwrap();
    }

    #[tokio::test]
    async fn path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::new(dir.path()).await.unwrap();

        let evil = AssetRef::new("../../../etc/passwd", "local");
        assert!(matches!(
            backend.fetch(&evil).await,
            Err(StorageError::InvalidLocation(_))
        ));
        assert!(matches!(
            backend.delete(&evil).await,
            Err(StorageError::InvalidLocation(_))
        ));
    }
}
