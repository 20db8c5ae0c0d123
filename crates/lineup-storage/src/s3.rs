use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use lineup_core::{AssetRef, BackendKind};
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::{Error as ObjectStoreError, ObjectStoreExt, PutPayload};

use crate::keys;
use crate::traits::{AssetBackend, StorageError, StorageResult, StoreHint};

/// S3-compatible object storage backend.
///
/// Locations are presigned GET URLs with an embedded expiry, so references
/// handed out by this backend are time-limited and must be re-signed on read.
/// The object key is recovered from the stored URL's path when deleting or
/// re-signing.
#[derive(Clone)]
pub struct S3Backend {
    store: AmazonS3,
    bucket: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    presign_expiry: Duration,
}

impl S3Backend {
    /// Create a new `S3Backend`.
    ///
    /// # Arguments
    /// * `bucket` - bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - optional custom endpoint for S3-compatible providers
    ///   (e.g. "http://localhost:9000" for MinIO)
    /// * `presign_expiry` - lifetime of presigned URLs this backend hands out
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        presign_expiry: Duration,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(S3Backend {
            store,
            bucket,
            endpoint_url,
            presign_expiry,
        })
    }

    /// Recover the object key from a stored presigned URL.
    fn key_from_location(&self, location: &str) -> StorageResult<String> {
        key_from_signed_url(location, &self.bucket, self.endpoint_url.is_some())
    }

    async fn sign(&self, key: &str) -> Result<String, ObjectStoreError> {
        let location = Path::from(key);
        let url = self
            .store
            .signed_url(Method::GET, &location, self.presign_expiry)
            .await?;
        Ok(url.to_string())
    }
}

/// A put that cannot be signed is a failed store, not a failed read: the
/// caller never receives a reference to the object.
fn presign_failure(e: impl std::fmt::Display) -> StorageError {
    StorageError::Write(format!("Failed to sign stored object: {}", e))
}

/// Extract the object key from a presigned URL's path, stripping the bucket
/// segment for path-style (custom endpoint) URLs and ignoring the signature
/// query string.
fn key_from_signed_url(
    location: &str,
    bucket: &str,
    path_style: bool,
) -> StorageResult<String> {
    let uri: http::Uri = location
        .parse()
        .map_err(|_| StorageError::InvalidLocation(format!("Unparsable URL: {}", location)))?;

    let mut path = uri.path().trim_start_matches('/');
    if path_style {
        path = path
            .strip_prefix(bucket)
            .map(|p| p.trim_start_matches('/'))
            .unwrap_or(path);
    }

    if path.is_empty() {
        return Err(StorageError::InvalidLocation(format!(
            "URL carries no object key: {}",
            location
        )));
    }

    Ok(path.to_string())
}

#[async_trait]
impl AssetBackend for S3Backend {
    fn backend_id(&self) -> &str {
        BackendKind::S3.id()
    }

    async fn store(&self, data: Vec<u8>, hint: &StoreHint) -> StorageResult<AssetRef> {
        let key = keys::avatar_key(hint);
        let size = data.len();
        let location = Path::from(key.clone());
        let start = std::time::Instant::now();

        self.store
            .put(&location, PutPayload::from(Bytes::from(data)))
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 store failed"
                );
                StorageError::Write(e.to_string())
            })?;

        let url = match self.sign(&key).await {
            Ok(url) => url,
            Err(e) => {
                // The bytes landed but no reference will record them; take the
                // object back out before reporting the store as failed.
                let _ = self.store.delete(&location).await;
                return Err(presign_failure(e));
            }
        };

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 store successful"
        );

        Ok(AssetRef::new(url, self.backend_id()))
    }

    async fn fetch(&self, reference: &AssetRef) -> StorageResult<Vec<u8>> {
        let key = self.key_from_location(&reference.location)?;
        let location = Path::from(key.clone());

        let result = self.store.get(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => {
                StorageError::Read(format!("Object not found: {}", key))
            }
            other => StorageError::Read(other.to_string()),
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::Read(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    async fn delete(&self, reference: &AssetRef) -> StorageResult<()> {
        let key = self.key_from_location(&reference.location)?;
        let location = Path::from(key.clone());
        let start = std::time::Instant::now();

        match self.store.delete(&location).await {
            Ok(()) => {}
            // Cleanup may race with retries; absent objects are fine.
            Err(ObjectStoreError::NotFound { .. }) => return Ok(()),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    "S3 delete failed"
                );
                return Err(StorageError::Write(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    fn is_time_limited(&self) -> bool {
        true
    }

    async fn refresh_url(&self, reference: &AssetRef) -> StorageResult<String> {
        let key = self.key_from_location(&reference.location)?;
        let location = Path::from(key.clone());

        match self.store.head(&location).await {
            Ok(_) => {}
            Err(ObjectStoreError::NotFound { .. }) => {
                return Err(StorageError::Read(format!("Object not found: {}", key)));
            }
            Err(e) => return Err(StorageError::Read(e.to_string())),
        }

        self.sign(&key)
            .await
            .map_err(|e| StorageError::Read(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_from_virtual_hosted_url() {
        let url = "https://avatars.s3.eu-west-1.amazonaws.com/avatars/p1/a1.png?X-Amz-Signature=abc&X-Amz-Expires=3600";
        let key = key_from_signed_url(url, "avatars", false).unwrap();
        assert_eq!(key, "avatars/p1/a1.png");
    }

    #[test]
    fn key_from_path_style_url_strips_bucket() {
        let url = "http://localhost:9000/avatars/avatars/p1/a1.png?X-Amz-Signature=abc";
        let key = key_from_signed_url(url, "avatars", true).unwrap();
        assert_eq!(key, "avatars/p1/a1.png");
    }

    #[test]
    fn url_without_key_rejected() {
        let err = key_from_signed_url("https://avatars.s3.amazonaws.com/", "avatars", false);
        assert!(matches!(err, Err(StorageError::InvalidLocation(_))));
    }

    #[test]
    fn presign_failure_is_a_write_error() {
        let err = presign_failure("signing key unavailable");
        assert!(matches!(err, StorageError::Write(_)));
    }

    #[test]
    fn garbage_location_rejected() {
        let err = key_from_signed_url("not a url at all", "avatars", false);
        assert!(matches!(err, Err(StorageError::InvalidLocation(_))));
    }
}
