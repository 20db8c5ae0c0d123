use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Durable record of a stored avatar file.
///
/// `location` is opaque to everything except the backend that produced it: a
/// relative key for the local backend, a presigned URL for the object store.
/// `backend_id` selects which backend owns the bytes. It is kept as a string so
/// a reference pointing at an unregistered backend is detected when the registry
/// resolves it, not silently dropped during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AssetRef {
    pub location: String,
    pub backend_id: String,
}

impl AssetRef {
    pub fn new(location: impl Into<String>, backend_id: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            backend_id: backend_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_location_backend_pair() {
        let asset = AssetRef::new("avatars/a.png", "local");
        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"location": "avatars/a.png", "backend_id": "local"})
        );
    }

    #[test]
    fn round_trips_unknown_backend_id() {
        // Corrupt data must survive deserialization so resolution can report it.
        let asset: AssetRef =
            serde_json::from_str(r#"{"location": "a.png", "backend_id": "ghost"}"#).unwrap();
        assert_eq!(asset.backend_id, "ghost");
    }
}
