//! Inkpress Storage Library
//!
//! Binary storage for uploaded files. The [FileStore] trait abstracts the
//! backend; [LocalFileStore] is the filesystem implementation.
//!
//! # Storage key format
//!
//! A key is the bare stored filename (optionally under a relative
//! subdirectory). Keys must not contain `..` or a leading `/`. New registry
//! rows always record the bare filename as their key; rows written before
//! the layout migration may hold an absolute path, which
//! [FileStore::resolve_key] reduces to its final component at read time.

pub mod local;
pub mod traits;

pub use local::LocalFileStore;
pub use traits::{ByteStream, FileStore, StorageError, StorageResult};
