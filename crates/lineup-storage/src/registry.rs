//! Backend registry: the one place that maps recorded backend ids back to
//! concrete backend instances.
//!
//! Built once at process start from configuration and read-only thereafter. A
//! reference carrying an id the registry does not know is corrupt data or a
//! configuration bug; resolution fails loudly and is never retried or
//! defaulted to another backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lineup_core::{BackendKind, Config};

use crate::local::LocalBackend;
use crate::memory::MemoryBackend;
use crate::s3::S3Backend;
use crate::traits::{AssetBackend, StorageError, StorageResult};

pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn AssetBackend>>,
    default_id: String,
}

impl BackendRegistry {
    /// Build a registry from explicit backend instances. `default_id` selects
    /// the backend new assets are stored in and must name a registered backend.
    pub fn new(
        backends: Vec<Arc<dyn AssetBackend>>,
        default_id: &str,
    ) -> StorageResult<Self> {
        let backends: HashMap<String, Arc<dyn AssetBackend>> = backends
            .into_iter()
            .map(|b| (b.backend_id().to_string(), b))
            .collect();

        if !backends.contains_key(default_id) {
            return Err(StorageError::Config(format!(
                "Default backend '{}' is not registered",
                default_id
            )));
        }

        Ok(Self {
            backends,
            default_id: default_id.to_string(),
        })
    }

    /// Construct every backend the configuration describes.
    ///
    /// The local backend is registered whenever `LOCAL_STORAGE_PATH` is set and
    /// the S3 backend whenever bucket and region are set, even when they are
    /// not the default: previously stored references may still name them.
    pub async fn from_config(config: &Config) -> StorageResult<Self> {
        let mut backends: Vec<Arc<dyn AssetBackend>> = Vec::new();

        if let Some(ref base_path) = config.local_storage_path {
            backends.push(Arc::new(LocalBackend::new(base_path.clone()).await?));
        }

        if let (Some(bucket), Some(region)) = (&config.s3_bucket, &config.s3_region) {
            backends.push(Arc::new(S3Backend::new(
                bucket.clone(),
                region.clone(),
                config.s3_endpoint.clone(),
                Duration::from_secs(config.presign_expiry_secs),
            )?));
        }

        if config.storage_backend == BackendKind::Memory {
            backends.push(Arc::new(MemoryBackend::new()));
        }

        let default_id = config.storage_backend.id();
        if !backends.iter().any(|b| b.backend_id() == default_id) {
            return Err(StorageError::Config(match config.storage_backend {
                BackendKind::Local => "LOCAL_STORAGE_PATH not configured".to_string(),
                BackendKind::S3 => "S3_BUCKET and S3_REGION not configured".to_string(),
                BackendKind::Memory => "Memory backend failed to register".to_string(),
            }));
        }

        let registry = Self::new(backends, default_id)?;
        tracing::info!(
            default_backend = %registry.default_id,
            registered = ?registry.backends.keys().collect::<Vec<_>>(),
            "Backend registry initialized"
        );
        Ok(registry)
    }

    /// Resolve a recorded backend id to its instance.
    pub fn resolve(&self, backend_id: &str) -> StorageResult<Arc<dyn AssetBackend>> {
        self.backends
            .get(backend_id)
            .cloned()
            .ok_or_else(|| StorageError::UnknownBackend(backend_id.to_string()))
    }

    /// The backend new assets are stored in.
    pub fn default_backend(&self) -> Arc<dyn AssetBackend> {
        self.backends[&self.default_id].clone()
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_registered_backend() {
        let registry =
            BackendRegistry::new(vec![Arc::new(MemoryBackend::new())], "memory").unwrap();
        assert_eq!(registry.resolve("memory").unwrap().backend_id(), "memory");
        assert_eq!(registry.default_id(), "memory");
    }

    #[test]
    fn unknown_backend_id_fails_loudly() {
        let registry =
            BackendRegistry::new(vec![Arc::new(MemoryBackend::new())], "memory").unwrap();
        assert!(matches!(
            registry.resolve("ghost"),
            Err(StorageError::UnknownBackend(_))
        ));
    }

    #[test]
    fn default_must_be_registered() {
        let err = BackendRegistry::new(vec![Arc::new(MemoryBackend::new())], "local");
        assert!(matches!(err, Err(StorageError::Config(_))));
    }
}
