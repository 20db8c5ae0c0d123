//! Lineup Core Library
//!
//! This crate provides the domain models, configuration, and constants shared
//! across all Lineup components: the durable asset reference, the player record
//! that owns it, and the backend identifiers used by configuration.

pub mod config;
pub mod constants;
pub mod models;
pub mod storage_kinds;

// Re-export commonly used types
pub use config::Config;
pub use models::{AssetRef, Player};
pub use storage_kinds::BackendKind;
