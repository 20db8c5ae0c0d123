use lineup_core::constants::{ALLOWED_AVATAR_CONTENT_TYPES, DEFAULT_MAX_AVATAR_SIZE_BYTES};
use lineup_core::Config;
use thiserror::Error;
use uuid::Uuid;

use crate::pipeline::UploadSubmission;

/// Upload rejection reasons, one variant per check.
///
/// Checks run in a fixed order and the first failure wins, so a submission
/// with several problems always reports the same one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Player id is required")]
    MissingPlayerId,
    #[error("Invalid player id: {0}")]
    InvalidPlayerId(String),
    #[error("No file was uploaded")]
    MissingFile,
    #[error("Uploaded file is empty")]
    EmptyFile,
    #[error("File size {size} exceeds maximum of {max} bytes")]
    FileTooLarge { size: u64, max: u64 },
    #[error("Content type '{content_type}' is not allowed (expected one of: {allowed})")]
    InvalidContentType {
        content_type: String,
        allowed: String,
    },
}

/// Fail-fast checks on an upload before any bytes are decoded.
///
/// Order: player id present, player id well formed, file present, file
/// non-empty, file within size limit, content type allowed.
#[derive(Clone)]
pub struct AvatarValidator {
    max_file_size: u64,
    allowed_content_types: Vec<String>,
}

impl AvatarValidator {
    pub fn new(max_file_size: u64, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_avatar_size_bytes as u64,
            ALLOWED_AVATAR_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    /// Validate a submission, returning the parsed player id on success.
    pub fn validate(&self, submission: &UploadSubmission) -> Result<Uuid, ValidationError> {
        let raw_id = submission.player_id.trim();
        if raw_id.is_empty() {
            return Err(ValidationError::MissingPlayerId);
        }
        let player_id = raw_id
            .parse::<Uuid>()
            .map_err(|_| ValidationError::InvalidPlayerId(raw_id.to_string()))?;

        let file = submission.file.as_ref().ok_or(ValidationError::MissingFile)?;

        if file.size_bytes == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if file.size_bytes > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size: file.size_bytes,
                max: self.max_file_size,
            });
        }

        match file.content_type.as_deref() {
            Some(ct) if self.allowed_content_types.iter().any(|a| a == ct) => {}
            other => {
                return Err(ValidationError::InvalidContentType {
                    content_type: other.unwrap_or("<none>").to_string(),
                    allowed: self.allowed_content_types.join(", "),
                });
            }
        }

        Ok(player_id)
    }
}

impl Default for AvatarValidator {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_AVATAR_SIZE_BYTES as u64,
            ALLOWED_AVATAR_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}
