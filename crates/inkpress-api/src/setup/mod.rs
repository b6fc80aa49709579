//! Application initialization: database, storage, state, and routes.

pub mod database;
pub mod routes;
pub mod server;

use crate::auth::JwtService;
use crate::state::AppState;
use anyhow::Result;
use inkpress_core::Config;
use inkpress_db::{DownloadRequestRepository, FileRepository, UserRepository};
use inkpress_storage::{FileStore, LocalFileStore};
use std::sync::Arc;

/// Build the application state and router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    let pool = database::setup_database(&config).await?;

    let uploads: Arc<dyn FileStore> = Arc::new(
        LocalFileStore::new(
            config.upload_dir.clone(),
            // Gated uploads are never publicly served; the base URL is unused
            // beyond diagnostics.
            String::new(),
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize upload storage: {}", e))?,
    );

    let public_storage: Arc<dyn FileStore> = Arc::new(
        LocalFileStore::new(
            config.public_storage_dir.clone(),
            config.public_storage_base_url.clone(),
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize public storage: {}", e))?,
    );

    let state = Arc::new(AppState {
        pool: pool.clone(),
        users: UserRepository::new(pool.clone()),
        files: FileRepository::new(pool.clone()),
        download_requests: DownloadRequestRepository::new(pool),
        jwt: JwtService::new(&config.jwt_secret, config.jwt_expiry_hours),
        uploads,
        public_storage,
        config: config.clone(),
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
