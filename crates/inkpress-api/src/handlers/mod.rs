//! HTTP handlers, grouped per route family.

pub mod auth;
pub mod download_requests;
pub mod file_download;
pub mod file_upload;
pub mod files;

use serde::Serialize;
use utoipa::ToSchema;

/// Plain confirmation body for mutations that return no entity.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}
