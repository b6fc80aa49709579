//! Test helpers: build the router and a test server without a live database.
//!
//! The pool is created lazily and never connected; these tests exercise the
//! surface that resolves before any query runs (routing, health, OpenAPI,
//! and the bearer-auth gate). Run with `cargo test -p inkpress-api`.

use axum_test::TestServer;
use inkpress_api::auth::JwtService;
use inkpress_api::setup::routes;
use inkpress_api::state::AppState;
use inkpress_core::Config;
use inkpress_db::{DownloadRequestRepository, FileRepository, UserRepository};
use inkpress_storage::{FileStore, LocalFileStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_JWT_SECRET: &str = "test-secret-key-min-32-characters-long";

pub struct TestApp {
    pub server: TestServer,
    _upload_dir: TempDir,
    _public_dir: TempDir,
}

fn test_config(upload_dir: &TempDir, public_dir: &TempDir) -> Config {
    Config {
        server_port: 0,
        // Never connected; the pool below is lazy
        database_url: "postgres://postgres@127.0.0.1:1/inkpress_test".to_string(),
        cors_origins: vec!["*".to_string()],
        db_max_connections: 1,
        db_timeout_seconds: 1,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_expiry_hours: 24,
        upload_dir: upload_dir.path().display().to_string(),
        public_storage_dir: public_dir.path().display().to_string(),
        public_storage_base_url: "/storage".to_string(),
        max_upload_bytes: 10 * 1024 * 1024,
        max_image_bytes: 5 * 1024 * 1024,
        allowed_mime_types: vec!["application/pdf".to_string(), "text/plain".to_string()],
        image_mime_types: vec!["image/png".to_string()],
        environment: "test".to_string(),
    }
}

pub async fn setup_test_app() -> TestApp {
    let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
    let public_dir = tempfile::tempdir().expect("Failed to create public dir");
    let config = test_config(&upload_dir, &public_dir);

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect_lazy(&config.database_url)
        .expect("Failed to create lazy pool");

    let uploads: Arc<dyn FileStore> = Arc::new(
        LocalFileStore::new(config.upload_dir.clone(), String::new())
            .await
            .expect("Failed to create upload storage"),
    );
    let public_storage: Arc<dyn FileStore> = Arc::new(
        LocalFileStore::new(
            config.public_storage_dir.clone(),
            config.public_storage_base_url.clone(),
        )
        .await
        .expect("Failed to create public storage"),
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

    let router = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        _upload_dir: upload_dir,
        _public_dir: public_dir,
    }
}
