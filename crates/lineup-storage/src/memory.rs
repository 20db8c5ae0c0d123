use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use lineup_core::{AssetRef, BackendKind};

use crate::keys;
use crate::traits::{AssetBackend, StorageError, StorageResult, StoreHint};

/// In-memory backend for tests and single-process setups.
///
/// Locations use a `memory://{key}` scheme. The time-limited variant appends a
/// rotating signature token so the resolver's refresh path can be exercised
/// without an object store.
pub struct MemoryBackend {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    time_limited: bool,
    signature: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            time_limited: false,
            signature: AtomicU64::new(0),
        }
    }

    /// Variant that hands out expiring locations, for exercising URL refresh.
    pub fn time_limited() -> Self {
        Self {
            time_limited: true,
            ..Self::new()
        }
    }

    /// Number of objects currently held. Lets tests assert nothing leaked.
    pub fn object_count(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or(0)
    }

    fn location_for(&self, key: &str) -> String {
        if self.time_limited {
            let sig = self.signature.fetch_add(1, Ordering::Relaxed);
            format!("memory://{}?sig={}", key, sig)
        } else {
            format!("memory://{}", key)
        }
    }

    fn key_from_location(location: &str) -> StorageResult<&str> {
        let key = location
            .strip_prefix("memory://")
            .ok_or_else(|| {
                StorageError::InvalidLocation(format!("Not a memory location: {}", location))
            })?
            .split('?')
            .next()
            .unwrap_or_default();

        if key.is_empty() {
            return Err(StorageError::InvalidLocation(format!(
                "Location carries no key: {}",
                location
            )));
        }

        Ok(key)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetBackend for MemoryBackend {
    fn backend_id(&self) -> &str {
        BackendKind::Memory.id()
    }

    async fn store(&self, data: Vec<u8>, hint: &StoreHint) -> StorageResult<AssetRef> {
        let key = keys::avatar_key(hint);

        self.objects
            .write()
            .map_err(|_| StorageError::Write("Object map poisoned".to_string()))?
            .insert(key.clone(), data);

        Ok(AssetRef::new(self.location_for(&key), self.backend_id()))
    }

    async fn fetch(&self, reference: &AssetRef) -> StorageResult<Vec<u8>> {
        let key = Self::key_from_location(&reference.location)?;

        self.objects
            .read()
            .map_err(|_| StorageError::Read("Object map poisoned".to_string()))?
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::Read(format!("Object not found: {}", key)))
    }

    async fn delete(&self, reference: &AssetRef) -> StorageResult<()> {
        let key = Self::key_from_location(&reference.location)?;

        // Absent keys are fine; delete is idempotent.
        self.objects
            .write()
            .map_err(|_| StorageError::Write("Object map poisoned".to_string()))?
            .remove(key);

        Ok(())
    }

    fn is_time_limited(&self) -> bool {
        self.time_limited
    }

    async fn refresh_url(&self, reference: &AssetRef) -> StorageResult<String> {
        let key = Self::key_from_location(&reference.location)?;

        let exists = self
            .objects
            .read()
            .map_err(|_| StorageError::Read("Object map poisoned".to_string()))?
            .contains_key(key);
        if !exists {
            return Err(StorageError::Read(format!("Object not found: {}", key)));
        }

        if self.time_limited {
            Ok(self.location_for(key))
        } else {
            Ok(reference.location.clone())
        }
    }
}
