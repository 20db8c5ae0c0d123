//! Storage abstraction trait
//!
//! This module defines the `AssetBackend` trait that all storage backends must
//! implement, and the error type their operations share.

use async_trait::async_trait;
use lineup_core::AssetRef;
use thiserror::Error;
use uuid::Uuid;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage write failed: {0}")]
    Write(String),

    #[error("Storage read failed: {0}")]
    Read(String),

    #[error("Unknown storage backend: {0}")]
    UnknownBackend(String),

    #[error("Invalid storage location: {0}")]
    InvalidLocation(String),

    #[error("Storage configuration error: {0}")]
    Config(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Naming hint passed to `store`: which player owns the asset and what file
/// extension the bytes carry.
#[derive(Debug, Clone)]
pub struct StoreHint {
    pub player_id: Uuid,
    pub extension: String,
}

impl StoreHint {
    pub fn new(player_id: Uuid, extension: impl Into<String>) -> Self {
        Self {
            player_id,
            extension: extension.into(),
        }
    }
}

/// Uniform capability set over heterogeneous storage media.
///
/// An `AssetRef` produced by `store` is only meaningful to the backend whose
/// `backend_id` it records; the registry is the one place that maps ids back to
/// instances.
#[async_trait]
pub trait AssetBackend: Send + Sync {
    /// Canonical id recorded on references this backend produces.
    fn backend_id(&self) -> &str;

    /// Persist bytes and return the durable reference. Safe to call
    /// concurrently with unrelated keys. Must not return a reference unless the
    /// bytes were fully written.
    async fn store(&self, data: Vec<u8>, hint: &StoreHint) -> StorageResult<AssetRef>;

    /// Read back the bytes a reference points at.
    async fn fetch(&self, reference: &AssetRef) -> StorageResult<Vec<u8>>;

    /// Remove the bytes a reference points at. Idempotent: deleting an
    /// already-absent object returns Ok, since cleanup may race with retries or
    /// manual removal.
    async fn delete(&self, reference: &AssetRef) -> StorageResult<()>;

    /// Whether locations handed out by this backend expire.
    fn is_time_limited(&self) -> bool;

    /// Produce a currently valid location for the reference. Identity for
    /// backends that are not time-limited; re-signs for those that are. Fails
    /// with `StorageError::Read` when the underlying object no longer exists.
    async fn refresh_url(&self, reference: &AssetRef) -> StorageResult<String>;
}
