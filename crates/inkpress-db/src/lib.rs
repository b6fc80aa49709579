//! Inkpress database layer.
//!
//! Repositories for the data access layer. Each repository owns one domain
//! entity and provides CRUD operations and specialized queries over a shared
//! Postgres pool.

pub mod db;

pub use db::{DownloadRequestRepository, FileRepository, UserRepository};
