use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::asset::AssetRef;

/// Player record, the entity that owns at most one avatar asset.
///
/// The wider player schema (position, foot, description and its validation)
/// lives with the profile service; this crate only models the fields the avatar
/// subsystem reads and writes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<AssetRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            avatar: None,
            created_at: now,
            updated_at: now,
        }
    }
}
