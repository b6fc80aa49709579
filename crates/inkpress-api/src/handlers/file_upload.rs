//! Upload routes: gated file uploads and publicly served featured images.

use crate::auth::models::UserContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::files::FileEnvelope;
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use inkpress_core::{models::FeaturedImage, AppError};
use serde::Serialize;
use std::path::Path as FsPath;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct FeaturedImageEnvelope {
    pub message: String,
    pub data: FeaturedImage,
}

/// One parsed multipart upload.
struct UploadPart {
    original_name: String,
    mime_type: String,
    data: Vec<u8>,
}

/// Generate a unique stored name, keeping the original extension.
fn stored_filename(prefix: &str, original_name: &str) -> String {
    let ext = FsPath::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();
    format!("{}-{}{}", prefix, Uuid::new_v4(), ext)
}

/// Pull the binary field (named `file` or `image`) and an optional `post_id`
/// text field out of a multipart body.
async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(Option<UploadPart>, Option<i64>), AppError> {
    let mut upload = None;
    let mut post_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart payload: {}", e)))?
    {
        match field.name() {
            Some("post_id") | Some("postId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Invalid post_id field: {}", e)))?;
                if !text.is_empty() {
                    post_id = Some(
                        text.parse::<i64>()
                            .map_err(|_| AppError::InvalidInput("Invalid post ID".to_string()))?,
                    );
                }
            }
            Some("file") | Some("image") => {
                let original_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| AppError::InvalidInput("Missing filename".to_string()))?;
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?
                    .to_vec();
                upload = Some(UploadPart {
                    original_name,
                    mime_type,
                    data,
                });
            }
            _ => {}
        }
    }

    Ok((upload, post_id))
}

fn validate_upload(
    part: &UploadPart,
    allowed: &[String],
    max_bytes: usize,
    type_error: &str,
) -> Result<(), AppError> {
    if part.data.is_empty() {
        return Err(AppError::InvalidInput("File is empty".to_string()));
    }
    if part.data.len() > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "{} bytes exceeds max {} bytes",
            part.data.len(),
            max_bytes
        )));
    }
    if !allowed.iter().any(|m| m == &part.mime_type) {
        return Err(AppError::InvalidInput(type_error.to_string()));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    responses(
        (status = 201, description = "File uploaded", body = FileEnvelope),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, multipart), fields(user_id = ctx.user_id, operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    ctx: UserContext,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    ctx.require_admin()?;

    let (upload, post_id) = read_multipart(multipart).await?;
    let part = upload.ok_or_else(|| AppError::InvalidInput("No file uploaded".to_string()))?;

    validate_upload(
        &part,
        &state.config.allowed_mime_types,
        state.config.max_upload_bytes,
        "Invalid file type. Only images, documents, and archives are allowed.",
    )?;

    let filename = stored_filename("file", &part.original_name);
    let file_size = part.data.len() as i64;

    // Binary first; the registry row references it by key
    let key = state.uploads.store(&filename, part.data).await?;

    let created = state
        .files
        .create(
            &filename,
            &part.original_name,
            &key,
            file_size,
            &part.mime_type,
            post_id,
            ctx.user_id,
        )
        .await;

    let file = match created {
        Ok(file) => file,
        Err(err) => {
            // Orphaned binary cleanup when the registry insert fails
            if let Err(cleanup_err) = state.uploads.delete(&key).await {
                tracing::warn!(error = %cleanup_err, key = %key, "Failed to clean up binary after insert failure");
            }
            return Err(err.into());
        }
    };

    let record = state
        .files
        .get_record(file.id)
        .await?
        .ok_or_else(|| AppError::Internal("File not found after creation".to_string()))?;

    tracing::info!(file_id = file.id, size_bytes = file_size, "File uploaded");

    Ok((
        StatusCode::CREATED,
        Json(FileEnvelope {
            message: "File uploaded successfully".to_string(),
            file: record,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/files/featured-image",
    tag = "files",
    responses(
        (status = 201, description = "Featured image uploaded", body = FeaturedImageEnvelope),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, multipart), fields(user_id = ctx.user_id, operation = "upload_featured_image"))]
pub async fn upload_featured_image(
    State(state): State<Arc<AppState>>,
    ctx: UserContext,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    ctx.require_admin()?;

    let (upload, _) = read_multipart(multipart).await?;
    let part = upload.ok_or_else(|| AppError::InvalidInput("No image uploaded".to_string()))?;

    validate_upload(
        &part,
        &state.config.image_mime_types,
        state.config.max_image_bytes,
        "Invalid file type. Only images are allowed for featured images.",
    )?;

    let filename = stored_filename("featured", &part.original_name);
    let file_size = part.data.len() as i64;

    let key = state.public_storage.store(&filename, part.data).await?;
    let url = state.public_storage.public_url(&key);

    tracing::info!(filename = %filename, size_bytes = file_size, "Featured image uploaded");

    Ok((
        StatusCode::CREATED,
        Json(FeaturedImageEnvelope {
            message: "Featured image uploaded successfully".to_string(),
            data: FeaturedImage {
                filename,
                original_name: part.original_name,
                url,
                file_size,
                mime_type: part.mime_type,
            },
        }),
    ))
}
