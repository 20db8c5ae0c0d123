//! Shared key generation for storage backends.
//!
//! Key format: `avatars/{player_id}/{asset_id}.{ext}`. Every stored avatar gets
//! a fresh asset id, so replacing an avatar never overwrites the previous
//! object in place.

use uuid::Uuid;

use crate::traits::StoreHint;

/// Generate a storage key for a new avatar asset.
pub fn avatar_key(hint: &StoreHint) -> String {
    format!(
        "avatars/{}/{}.{}",
        hint.player_id,
        Uuid::new_v4(),
        hint.extension
    )
}
