use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// A staged upload on the local spool directory.
///
/// The file must be removed on every exit path of the pipeline, success or
/// failure. Removal is done explicitly with [`TempUpload::remove`] so the
/// outcome can be logged; `Drop` is only a synchronous fallback for paths that
/// abandon the guard early.
pub struct TempUpload {
    path: Option<PathBuf>,
}

impl TempUpload {
    /// Write the uploaded bytes to a fresh file under `spool_dir`.
    pub async fn stage(spool_dir: &Path, data: &[u8]) -> std::io::Result<Self> {
        fs::create_dir_all(spool_dir).await?;

        let path = spool_dir.join(format!("{}.upload", Uuid::new_v4()));
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        Ok(Self { path: Some(path) })
    }

    /// Adopt an already staged file, e.g. one written by the HTTP layer.
    pub fn from_path(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().expect("temp upload already removed")
    }

    /// Read the staged bytes back.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        fs::read(self.path()).await
    }

    /// Remove the staged file. A file that is already gone is not an error.
    pub async fn remove(mut self) {
        if let Some(path) = self.path.take() {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove staged upload");
                }
            }
        }
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}
