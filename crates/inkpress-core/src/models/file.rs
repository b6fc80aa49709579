use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One registered upload: the catalog row for a binary on disk.
///
/// `file_path` is the storage key. New rows always store the bare stored
/// filename; historical rows may hold an absolute path from before the
/// storage layout migration, which the read side resolves via fallback.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StoredFile {
    pub id: i64,
    /// Unique stored name on disk.
    pub filename: String,
    /// User-facing name, used for the download Content-Disposition.
    pub original_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub post_id: Option<i64>,
    pub uploaded_by: Option<i64>,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// File row joined with display fields for list/detail responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FileRecord {
    pub id: i64,
    pub filename: String,
    pub original_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub post_id: Option<i64>,
    pub uploaded_by: Option<i64>,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub uploaded_by_name: Option<String>,
    pub post_title: Option<String>,
    pub post_slug: Option<String>,
}

/// Body for PUT /api/files/{id}: re-attach or detach the owning post.
/// An absent or null `post_id` detaches the file.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateFileRequest {
    #[serde(default, alias = "postId")]
    pub post_id: Option<i64>,
}

/// Featured-image upload result: publicly served, no registry row.
#[derive(Debug, Serialize, ToSchema)]
pub struct FeaturedImage {
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub file_size: i64,
    pub mime_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_file_request_accepts_camel_case_alias() {
        let body: UpdateFileRequest = serde_json::from_str(r#"{"postId": 42}"#).unwrap();
        assert_eq!(body.post_id, Some(42));

        let detach: UpdateFileRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(detach.post_id, None);
    }

    #[test]
    fn test_stored_file_serializes_counter() {
        let file = StoredFile {
            id: 1,
            filename: "file-9f8e.pdf".to_string(),
            original_name: "quarterly report.pdf".to_string(),
            file_path: "file-9f8e.pdf".to_string(),
            file_size: 2048,
            mime_type: "application/pdf".to_string(),
            post_id: Some(3),
            uploaded_by: Some(1),
            download_count: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["download_count"], 5);
        assert_eq!(json["original_name"], "quarterly report.pdf");
    }
}
