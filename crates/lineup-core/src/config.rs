//! Configuration module
//!
//! Environment-based configuration, read once at startup. The storage section
//! is consumed by the backend registry; the avatar section by the validator and
//! transform; the server section by the api binary.

use std::env;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_AVATAR_TARGET_DIM, DEFAULT_MAX_AVATAR_SIZE_BYTES, DEFAULT_PRESIGN_EXPIRY_SECS,
};
use crate::storage_kinds::BackendKind;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    // Storage configuration
    pub storage_backend: BackendKind,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub presign_expiry_secs: u64,
    // Avatar processing configuration
    pub max_avatar_size_bytes: usize,
    pub avatar_target_dim: u32,
    // Directory uploads are spooled to before the pipeline runs
    pub spool_dir: String,
}

impl Config {
    /// Load configuration from the environment (and `.env` when present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(v) => BackendKind::from_str(&v)?,
            Err(_) => BackendKind::Local,
        };

        Ok(Self {
            server_port: parse_env("SERVER_PORT", 3000)?,
            storage_backend,
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok().or(env::var("AWS_REGION").ok()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            presign_expiry_secs: parse_env("PRESIGN_EXPIRY_SECS", DEFAULT_PRESIGN_EXPIRY_SECS)?,
            max_avatar_size_bytes: parse_env(
                "MAX_AVATAR_SIZE_BYTES",
                DEFAULT_MAX_AVATAR_SIZE_BYTES,
            )?,
            avatar_target_dim: parse_env("AVATAR_TARGET_DIM", DEFAULT_AVATAR_TARGET_DIM)?,
            spool_dir: env::var("SPOOL_DIR").unwrap_or_else(|_| env::temp_dir().display().to_string()),
        })
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) => v
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}
