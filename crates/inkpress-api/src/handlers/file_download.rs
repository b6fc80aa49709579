//! The download endpoint: orchestrates the registry row, binary resolution,
//! the access decision, the counter bump, and the byte stream.

use crate::auth::models::UserContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, Response, StatusCode},
    response::IntoResponse,
};
use futures::StreamExt;
use inkpress_core::{
    access::{evaluate_access, AccessOutcome, AccessRequest, LedgerView},
    AppError,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Structured refusal: tells the client whether to offer "request access"
/// or "request already pending" without a second round trip.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRefusal {
    pub error: String,
    pub needs_request: bool,
    pub has_pending_request: bool,
}

impl DownloadRefusal {
    fn needs_request() -> Self {
        DownloadRefusal {
            error: "Access denied. Request access to download this file.".to_string(),
            needs_request: true,
            has_pending_request: false,
        }
    }

    fn pending() -> Self {
        DownloadRefusal {
            error: "Your download request is awaiting approval.".to_string(),
            needs_request: false,
            has_pending_request: true,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/files/{id}/download",
    tag = "files",
    params(("id" = i64, Path, description = "File ID")),
    responses(
        (status = 200, description = "File binary", content_type = "application/octet-stream"),
        (status = 403, description = "Access refused", body = DownloadRefusal),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = ctx.user_id, file_id = %id, operation = "download_file"))]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    ctx: UserContext,
    Path(id): Path<i64>,
) -> Result<axum::response::Response, HttpAppError> {
    let file = state
        .files
        .get_row(id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let resolved = state
        .uploads
        .resolve_key(&file.file_path, &file.filename)
        .await?;

    // No in-process caching of approval state: re-read the ledger every time
    let ledger = if ctx.is_admin() {
        LedgerView::default()
    } else {
        state.download_requests.ledger_view(ctx.user_id, id).await?
    };

    let outcome = evaluate_access(&AccessRequest {
        is_admin: ctx.is_admin(),
        file_exists: true,
        binary_available: resolved.is_some(),
        ledger,
    });

    let key = match (outcome, resolved) {
        (AccessOutcome::NotFound, _) | (_, None) => {
            return Err(AppError::NotFound("File not found on server".to_string()).into());
        }
        (AccessOutcome::RequestRequired, _) => {
            return Ok((
                StatusCode::FORBIDDEN,
                axum::Json(DownloadRefusal::needs_request()),
            )
                .into_response());
        }
        (AccessOutcome::PendingExists, _) => {
            return Ok((StatusCode::FORBIDDEN, axum::Json(DownloadRefusal::pending())).into_response());
        }
        (AccessOutcome::Allowed, Some(key)) => key,
    };

    // The counter is informational; a failed bump never aborts the download
    if let Err(err) = state.files.increment_download_count(id).await {
        tracing::warn!(file_id = id, error = %err, "Failed to increment download counter");
    }

    let stream = state.uploads.open_stream(&key).await?;
    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    let content_disposition = format!("attachment; filename=\"{}\"", file.original_name);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, file.mime_type.as_str())
        .header(header::CONTENT_LENGTH, file.file_size)
        .header(header::CONTENT_DISPOSITION, content_disposition.as_str())
        .body(Body::from_stream(body_stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    tracing::debug!(file_id = id, key = %key, "Streaming file download");

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refusal_payload_shapes() {
        let needs = serde_json::to_value(DownloadRefusal::needs_request()).unwrap();
        assert_eq!(needs["needsRequest"], true);
        assert_eq!(needs["hasPendingRequest"], false);

        let pending = serde_json::to_value(DownloadRefusal::pending()).unwrap();
        assert_eq!(pending["needsRequest"], false);
        assert_eq!(pending["hasPendingRequest"], true);
        assert!(pending["error"].as_str().unwrap().contains("approval"));
    }
}
