//! Database repositories for data access layer
//!
//! Repositories are organized per entity: users (identity), files (the
//! upload registry), and download_requests (the request ledger).

pub mod download_requests;
pub mod files;
pub mod users;

pub use download_requests::DownloadRequestRepository;
pub use files::FileRepository;
pub use users::UserRepository;
