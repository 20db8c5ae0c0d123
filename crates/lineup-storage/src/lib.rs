//! Lineup Storage Library
//!
//! Storage backend abstraction and implementations for avatar assets. A backend
//! persists opaque bytes, deletes them idempotently, and hands out access
//! locations; time-limited backends (S3 presigned URLs) can re-sign a stored
//! location on demand.
//!
//! # Key format
//!
//! All backends store avatars under the same key layout:
//! `avatars/{player_id}/{asset_id}.{ext}`. Keys must not contain `..` or a
//! leading `/`; key generation is centralized in the `keys` module.

pub(crate) mod keys;
pub mod local;
pub mod memory;
pub mod registry;
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use local::LocalBackend;
pub use memory::MemoryBackend;
pub use registry::BackendRegistry;
pub use s3::S3Backend;
pub use traits::{AssetBackend, StorageError, StorageResult, StoreHint};
