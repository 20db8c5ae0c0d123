//! Shared constants.

/// Default maximum accepted avatar upload size in bytes (2 MiB).
pub const DEFAULT_MAX_AVATAR_SIZE_BYTES: usize = 2 * 1024 * 1024;

/// Default square dimension avatars are normalized to.
pub const DEFAULT_AVATAR_TARGET_DIM: u32 = 256;

/// Default lifetime of presigned URLs handed out by time-limited backends.
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 24 * 60 * 60;

/// Content types accepted for avatar uploads.
pub const ALLOWED_AVATAR_CONTENT_TYPES: &[&str] =
    &["image/png", "image/jpeg", "image/webp", "image/gif"];
