//! Application state shared by all handlers.

use crate::auth::JwtService;
use inkpress_core::Config;
use inkpress_db::{DownloadRequestRepository, FileRepository, UserRepository};
use inkpress_storage::FileStore;
use sqlx::PgPool;
use std::sync::Arc;

/// Main application state: repositories, storage backends, and configuration.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub users: UserRepository,
    pub files: FileRepository,
    pub download_requests: DownloadRequestRepository,
    pub jwt: JwtService,
    /// Gated upload binaries; not publicly served.
    pub uploads: Arc<dyn FileStore>,
    /// Publicly served featured images.
    pub public_storage: Arc<dyn FileStore>,
    pub config: Config,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
