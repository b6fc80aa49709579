//! Route configuration and setup.

use crate::api_doc::ApiDoc;
use crate::auth::middleware::identity_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use inkpress_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    // Multipart framing adds overhead on top of the raw file size
    let body_limit = config.max_upload_bytes.max(config.max_image_bytes) + 1024 * 1024;

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/openapi.json", get(openapi_spec))
        // Identity
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/admin-register", post(handlers::auth::admin_register))
        .route("/api/auth/profile", get(handlers::auth::profile))
        .route("/api/auth/change-password", put(handlers::auth::change_password))
        .route("/api/auth/users/count", get(handlers::auth::users_count))
        // File registry
        .route("/api/files/upload", post(handlers::file_upload::upload_file))
        .route(
            "/api/files/featured-image",
            post(handlers::file_upload::upload_featured_image),
        )
        .route("/api/files", get(handlers::files::list_files))
        .route(
            "/api/files/{id}",
            get(handlers::files::get_file)
                .put(handlers::files::update_file)
                .delete(handlers::files::delete_file),
        )
        .route(
            "/api/files/{id}/download",
            get(handlers::file_download::download_file),
        )
        // Download-request ledger
        .route(
            "/api/download-requests",
            post(handlers::download_requests::create_download_request)
                .get(handlers::download_requests::list_download_requests),
        )
        .route(
            "/api/download-requests/check/{file_id}",
            get(handlers::download_requests::check_download_request),
        )
        .route(
            "/api/download-requests/my-requests",
            get(handlers::download_requests::my_requests),
        )
        .route(
            "/api/download-requests/{id}",
            get(handlers::download_requests::get_download_request)
                .put(handlers::download_requests::update_download_request)
                .delete(handlers::download_requests::delete_download_request),
        )
        // Featured images are served statically
        .nest_service("/storage", ServeDir::new(&config.public_storage_dir))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {}: {}", origin, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers(Any)
    };
    Ok(cors)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn openapi_spec() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
