//! Lineup Avatar Library
//!
//! The avatar-processing pipeline: validate an uploaded image, normalize it to
//! the canonical square format, persist it through the configured storage
//! backend, swap it for any previously stored asset, and resolve stored
//! references (refreshing time-limited URLs) on read.

pub mod pipeline;
pub mod players;
pub mod resolver;
pub mod temp;
pub mod transform;
pub mod validator;

// Re-export commonly used types
pub use pipeline::{AvatarPipeline, PipelineError, StagedUpload, UploadSubmission};
pub use players::{MemoryPlayerStore, PlayerStore, PlayerStoreError};
pub use resolver::AssetResolver;
pub use temp::TempUpload;
pub use transform::{Normalizer, TransformError, CANONICAL_CONTENT_TYPE, CANONICAL_EXTENSION};
pub use validator::{AvatarValidator, ValidationError};
