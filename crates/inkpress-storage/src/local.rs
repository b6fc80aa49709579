use crate::traits::{ByteStream, FileStore, StorageError, StorageResult};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalFileStore {
    base_path: PathBuf,
    base_url: String,
}

impl LocalFileStore {
    /// Create a new LocalFileStore instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "uploads")
    /// * `base_url` - URL prefix for publicly served files (e.g., "/storage")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalFileStore {
            base_path,
            base_url,
        })
    }

    /// Convert a storage key to a filesystem path, rejecting path traversal
    /// sequences that could escape the base directory.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty()
            || key.starts_with('/')
            || key.contains("..")
            || key.contains('\\')
        {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }
        Ok(self.base_path.join(key))
    }

    /// Reduce a legacy registered path to a candidate key. Rows written
    /// before the layout migration stored an absolute path; only the final
    /// component is meaningful under the current layout.
    fn legacy_candidate(stored_path: &str) -> Option<String> {
        Path::new(stored_path)
            .file_name()
            .and_then(|name| name.to_str())
            .map(String::from)
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, filename: &str, data: Vec<u8>) -> StorageResult<String> {
        let path = self.key_to_path(filename)?;
        let size = data.len();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(filename.to_string())
    }

    async fn open_stream(&self, key: &str) -> StorageResult<ByteStream> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let reader = tokio_util::io::ReaderStream::new(file);

        let stream = reader.map(|result| {
            result.map_err(|e| StorageError::ReadFailed(format!("Failed to read chunk: {}", e)))
        });

        let path_display = path.display().to_string();
        let logged_stream = stream.map(move |item| {
            if item.is_err() {
                tracing::error!(path = %path_display, "Local storage stream read error");
            }
            item
        });

        Ok(Box::pin(logged_stream))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), "Local storage delete successful");

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn resolve_key(
        &self,
        stored_path: &str,
        filename: &str,
    ) -> StorageResult<Option<String>> {
        // Current layout: the registered path is already a valid key.
        if self.key_to_path(stored_path).is_ok() && self.exists(stored_path).await? {
            return Ok(Some(stored_path.to_string()));
        }

        // Legacy rows: reduce the registered path to its final component.
        if let Some(candidate) = Self::legacy_candidate(stored_path) {
            if candidate != stored_path && self.exists(&candidate).await? {
                tracing::debug!(
                    stored_path = %stored_path,
                    resolved = %candidate,
                    "Resolved legacy file path to bare filename"
                );
                return Ok(Some(candidate));
            }
        }

        // Last resort: the stored filename column.
        if filename != stored_path && self.exists(filename).await? {
            return Ok(Some(filename.to_string()));
        }

        Ok(None)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tempfile::tempdir;

    async fn test_store(dir: &tempfile::TempDir) -> LocalFileStore {
        LocalFileStore::new(dir.path(), "/storage".to_string())
            .await
            .unwrap()
    }

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_store_and_stream_roundtrip() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir).await;

        let data = b"gated report contents".to_vec();
        let key = store.store("file-1a2b.pdf", data.clone()).await.unwrap();
        assert_eq!(key, "file-1a2b.pdf");

        let downloaded = collect(store.open_stream(&key).await.unwrap()).await;
        assert_eq!(data, downloaded);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir).await;

        let result = store.open_stream("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = store.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = store.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_ok() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir).await;

        assert!(store.delete("nonexistent.txt").await.is_ok());
    }

    #[tokio::test]
    async fn test_exists() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir).await;

        store.store("present.txt", b"x".to_vec()).await.unwrap();
        assert!(store.exists("present.txt").await.unwrap());
        assert!(!store.exists("absent.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_open_stream_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir).await;

        let result = store.open_stream("missing.pdf").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_resolve_key_current_layout() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir).await;

        store.store("file-3c4d.zip", b"zip".to_vec()).await.unwrap();
        let resolved = store.resolve_key("file-3c4d.zip", "file-3c4d.zip").await.unwrap();
        assert_eq!(resolved.as_deref(), Some("file-3c4d.zip"));
    }

    #[tokio::test]
    async fn test_resolve_key_legacy_absolute_path() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir).await;

        store.store("file-5e6f.pdf", b"pdf".to_vec()).await.unwrap();

        // A row written before the layout migration registered the full path.
        let resolved = store
            .resolve_key("/srv/blog/backend/uploads/file-5e6f.pdf", "file-5e6f.pdf")
            .await
            .unwrap();
        assert_eq!(resolved.as_deref(), Some("file-5e6f.pdf"));
    }

    #[tokio::test]
    async fn test_resolve_key_falls_back_to_filename_column() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir).await;

        store.store("file-7a8b.csv", b"a,b".to_vec()).await.unwrap();

        let resolved = store
            .resolve_key("/old/location/renamed.csv", "file-7a8b.csv")
            .await
            .unwrap();
        assert_eq!(resolved.as_deref(), Some("file-7a8b.csv"));
    }

    #[tokio::test]
    async fn test_resolve_key_missing_everywhere() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir).await;

        let resolved = store
            .resolve_key("/srv/blog/uploads/gone.pdf", "gone.pdf")
            .await
            .unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_public_url_joins_cleanly() {
        let store = LocalFileStore {
            base_path: PathBuf::from("/tmp/x"),
            base_url: "/storage/".to_string(),
        };
        assert_eq!(store.public_url("featured-1.png"), "/storage/featured-1.png");
    }
}
