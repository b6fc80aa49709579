//! Storage abstraction trait
//!
//! This module defines the FileStore trait that storage backends implement.

use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked byte stream produced by [FileStore::open_stream].
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction for uploaded binaries.
///
/// The registry references binaries by storage key; handlers never touch
/// paths directly. See the crate root documentation for the key format.
#[async_trait::async_trait]
pub trait FileStore: Send + Sync {
    /// Persist a binary under the given stored filename and return its key.
    async fn store(&self, filename: &str, data: Vec<u8>) -> StorageResult<String>;

    /// Open a binary as a chunked byte stream.
    async fn open_stream(&self, key: &str) -> StorageResult<ByteStream>;

    /// Delete a binary. Deleting a missing binary is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check whether a binary exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Resolve the storage key for a registry row, handling legacy rows.
    ///
    /// Tries the registered key first; if it is stale (or an absolute path
    /// from before the layout migration), falls back to the bare stored
    /// filename. Returns `None` when neither resolves.
    async fn resolve_key(&self, stored_path: &str, filename: &str)
        -> StorageResult<Option<String>>;

    /// Public URL under which a key is served, for publicly stored files.
    fn public_url(&self, key: &str) -> String;
}
