//! File registry routes: list, detail, re-attach, delete.

use crate::auth::models::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::MessageResponse;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use inkpress_core::{
    models::{FileRecord, UpdateFileRequest},
    AppError, PageParams, Pagination,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

const DEFAULT_FILE_PAGE_SIZE: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct FileListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default, alias = "postId")]
    pub post_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileListResponse {
    pub files: Vec<FileRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileEnvelope {
    pub message: String,
    pub file: FileRecord,
}

#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    params(
        ("page" = Option<i64>, Query, description = "Page number (>= 1)"),
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("post_id" = Option<i64>, Query, description = "Filter to one post")
    ),
    responses(
        (status = 200, description = "Paginated file list", body = FileListResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = ctx.user_id, operation = "list_files"))]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    ctx: UserContext,
    Query(query): Query<FileListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    ctx.require_admin()?;

    let params = PageParams::new(query.page, query.limit, DEFAULT_FILE_PAGE_SIZE);
    let (files, total) = state.files.list(params, query.post_id).await?;

    Ok(Json(FileListResponse {
        files,
        pagination: Pagination::new(params, total),
    }))
}

#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = i64, Path, description = "File ID")),
    responses(
        (status = 200, description = "File metadata", body = FileRecord),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(file_id = %id, operation = "get_file"))]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let file = state
        .files
        .get_record(id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    Ok(Json(file))
}

#[utoipa::path(
    put,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = i64, Path, description = "File ID")),
    request_body = UpdateFileRequest,
    responses(
        (status = 200, description = "File updated", body = FileEnvelope),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, body), fields(user_id = ctx.user_id, file_id = %id, operation = "update_file"))]
pub async fn update_file(
    State(state): State<Arc<AppState>>,
    ctx: UserContext,
    Path(id): Path<i64>,
    ValidatedJson(body): ValidatedJson<UpdateFileRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    ctx.require_admin()?;

    if !state.files.set_post(id, body.post_id).await? {
        return Err(AppError::NotFound("File not found".to_string()).into());
    }

    let file = state
        .files
        .get_record(id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    Ok(Json(FileEnvelope {
        message: "File updated successfully".to_string(),
        file,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = i64, Path, description = "File ID")),
    responses(
        (status = 200, description = "File deleted", body = MessageResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = ctx.user_id, file_id = %id, operation = "delete_file"))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    ctx: UserContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    ctx.require_admin()?;

    let file = state
        .files
        .get_row(id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    // A missing binary must not block registry deletion
    if let Ok(Some(key)) = state.uploads.resolve_key(&file.file_path, &file.filename).await {
        if let Err(err) = state.uploads.delete(&key).await {
            tracing::warn!(file_id = id, error = %err, "Failed to delete binary from storage");
        }
    }

    state.files.delete(id).await?;

    Ok(Json(MessageResponse::new("File deleted successfully")))
}
