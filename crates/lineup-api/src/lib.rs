//! Lineup API
//!
//! HTTP surface over the avatar pipeline: player CRUD, avatar upload, and
//! serving of locally stored media.

pub mod api_doc;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use state::AppState;
