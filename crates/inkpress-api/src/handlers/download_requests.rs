//! Download-request ledger routes: create, poll, list, inspect, decide, delete.

use crate::auth::models::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::MessageResponse;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use inkpress_core::{
    models::{
        CreateDownloadRequest, DownloadRequestRecord, RequestCheck, RequestStatus,
        UpdateDownloadRequest,
    },
    AppError, PageParams, Pagination,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

const DEFAULT_OWN_PAGE_SIZE: i64 = 10;
const DEFAULT_ADMIN_PAGE_SIZE: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct RequestListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<RequestStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestListResponse {
    pub requests: Vec<DownloadRequestRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestEnvelope {
    pub message: String,
    pub request: DownloadRequestRecord,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestResponse {
    pub request: DownloadRequestRecord,
}

#[utoipa::path(
    post,
    path = "/api/download-requests",
    tag = "download-requests",
    request_body = CreateDownloadRequest,
    responses(
        (status = 201, description = "Request created", body = RequestEnvelope),
        (status = 400, description = "Duplicate pending request", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, body), fields(user_id = ctx.user_id, operation = "create_download_request"))]
pub async fn create_download_request(
    State(state): State<Arc<AppState>>,
    ctx: UserContext,
    ValidatedJson(body): ValidatedJson<CreateDownloadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    body.validate().map_err(AppError::from)?;

    state
        .files
        .get_row(body.file_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    // Atomic under concurrency: a duplicate pending request surfaces as
    // Conflict from the partial unique index, not from a pre-check.
    let request = state
        .download_requests
        .create(ctx.user_id, body.file_id, body.notes.as_deref())
        .await?;

    let record = state
        .download_requests
        .get_record(request.id)
        .await?
        .ok_or_else(|| AppError::Internal("Download request not found after creation".to_string()))?;

    tracing::info!(request_id = request.id, file_id = body.file_id, "Download request created");

    Ok((
        StatusCode::CREATED,
        Json(RequestEnvelope {
            message: "Download request created successfully".to_string(),
            request: record,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/download-requests/check/{file_id}",
    tag = "download-requests",
    params(("file_id" = i64, Path, description = "File ID")),
    responses(
        (status = 200, description = "The requester's latest request for the file", body = RequestCheck)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = ctx.user_id, file_id = %file_id, operation = "check_download_request"))]
pub async fn check_download_request(
    State(state): State<Arc<AppState>>,
    ctx: UserContext,
    Path(file_id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let latest = state
        .download_requests
        .latest_for(ctx.user_id, file_id)
        .await?;

    let check = match latest {
        Some(request) => RequestCheck::from_request(&request),
        None => RequestCheck::none(),
    };

    Ok(Json(check))
}

#[utoipa::path(
    get,
    path = "/api/download-requests/my-requests",
    tag = "download-requests",
    params(
        ("page" = Option<i64>, Query, description = "Page number (>= 1)"),
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("status" = Option<String>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "Own request history", body = RequestListResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = ctx.user_id, operation = "my_download_requests"))]
pub async fn my_requests(
    State(state): State<Arc<AppState>>,
    ctx: UserContext,
    Query(query): Query<RequestListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let params = PageParams::new(query.page, query.limit, DEFAULT_OWN_PAGE_SIZE);
    let (requests, total) = state
        .download_requests
        .list_for_user(ctx.user_id, query.status, params)
        .await?;

    Ok(Json(RequestListResponse {
        requests,
        pagination: Pagination::new(params, total),
    }))
}

#[utoipa::path(
    get,
    path = "/api/download-requests",
    tag = "download-requests",
    params(
        ("page" = Option<i64>, Query, description = "Page number (>= 1)"),
        ("limit" = Option<i64>, Query, description = "Page size (1-100)"),
        ("status" = Option<String>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "All requests (admin view)", body = RequestListResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = ctx.user_id, operation = "list_download_requests"))]
pub async fn list_download_requests(
    State(state): State<Arc<AppState>>,
    ctx: UserContext,
    Query(query): Query<RequestListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    ctx.require_admin()?;

    let params = PageParams::new(query.page, query.limit, DEFAULT_ADMIN_PAGE_SIZE);
    let (requests, total) = state
        .download_requests
        .list_all(query.status, params)
        .await?;

    Ok(Json(RequestListResponse {
        requests,
        pagination: Pagination::new(params, total),
    }))
}

#[utoipa::path(
    get,
    path = "/api/download-requests/{id}",
    tag = "download-requests",
    params(("id" = i64, Path, description = "Request ID")),
    responses(
        (status = 200, description = "One request", body = RequestResponse),
        (status = 403, description = "Not the owner and not an admin", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = ctx.user_id, request_id = %id, operation = "get_download_request"))]
pub async fn get_download_request(
    State(state): State<Arc<AppState>>,
    ctx: UserContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state
        .download_requests
        .get_record(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Download request not found".to_string()))?;

    // Visible to its owner and to admins only
    if record.user_id != ctx.user_id && !ctx.is_admin() {
        return Err(AppError::Forbidden("Access denied".to_string()).into());
    }

    Ok(Json(RequestResponse { request: record }))
}

#[utoipa::path(
    put,
    path = "/api/download-requests/{id}",
    tag = "download-requests",
    params(("id" = i64, Path, description = "Request ID")),
    request_body = UpdateDownloadRequest,
    responses(
        (status = 200, description = "Request updated", body = RequestEnvelope),
        (status = 400, description = "Invalid status value", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, body), fields(user_id = ctx.user_id, request_id = %id, operation = "update_download_request"))]
pub async fn update_download_request(
    State(state): State<Arc<AppState>>,
    ctx: UserContext,
    Path(id): Path<i64>,
    ValidatedJson(body): ValidatedJson<UpdateDownloadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    ctx.require_admin()?;
    body.validate().map_err(AppError::from)?;

    let current = state
        .download_requests
        .get_row(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Download request not found".to_string()))?;

    let new_status = current
        .status
        .transition(body.status)
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let updated = state
        .download_requests
        .transition(id, new_status, ctx.user_id, body.notes.as_deref())
        .await?;
    if !updated {
        return Err(AppError::NotFound("Download request not found".to_string()).into());
    }

    let record = state
        .download_requests
        .get_record(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Download request not found".to_string()))?;

    tracing::info!(
        request_id = id,
        status = %new_status,
        "Download request transitioned"
    );

    Ok(Json(RequestEnvelope {
        message: "Download request updated successfully".to_string(),
        request: record,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/download-requests/{id}",
    tag = "download-requests",
    params(("id" = i64, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request deleted", body = MessageResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = ctx.user_id, request_id = %id, operation = "delete_download_request"))]
pub async fn delete_download_request(
    State(state): State<Arc<AppState>>,
    ctx: UserContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    ctx.require_admin()?;

    if !state.download_requests.delete(id).await? {
        return Err(AppError::NotFound("Download request not found".to_string()).into());
    }

    Ok(Json(MessageResponse::new(
        "Download request deleted successfully",
    )))
}
