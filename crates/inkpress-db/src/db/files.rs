use inkpress_core::{
    models::{FileRecord, StoredFile},
    AppError, PageParams,
};
use sqlx::{PgPool, Postgres};

const FILE_RECORD_SELECT: &str = r#"
    SELECT
        f.id, f.filename, f.original_name, f.file_path, f.file_size, f.mime_type,
        f.post_id, f.uploaded_by, f.download_count, f.created_at, f.updated_at,
        u.username AS uploaded_by_name,
        p.title AS post_title,
        p.slug AS post_slug
    FROM files f
    LEFT JOIN users u ON f.uploaded_by = u.id
    LEFT JOIN posts p ON f.post_id = p.id
"#;

/// Repository for the upload registry.
#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register an uploaded binary. The binary must already be persisted;
    /// `file_path` is the storage key (always the bare stored filename for
    /// new rows).
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "insert"))]
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        filename: &str,
        original_name: &str,
        file_path: &str,
        file_size: i64,
        mime_type: &str,
        post_id: Option<i64>,
        uploaded_by: i64,
    ) -> Result<StoredFile, AppError> {
        let file = sqlx::query_as::<Postgres, StoredFile>(
            r#"
            INSERT INTO files (filename, original_name, file_path, file_size, mime_type, post_id, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, filename, original_name, file_path, file_size, mime_type,
                      post_id, uploaded_by, download_count, created_at, updated_at
            "#,
        )
        .bind(filename)
        .bind(original_name)
        .bind(file_path)
        .bind(file_size)
        .bind(mime_type)
        .bind(post_id)
        .bind(uploaded_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(file)
    }

    /// Fetch the bare registry row (no joins), as the download path needs it.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    pub async fn get_row(&self, id: i64) -> Result<Option<StoredFile>, AppError> {
        let file = sqlx::query_as::<Postgres, StoredFile>(
            r#"
            SELECT id, filename, original_name, file_path, file_size, mime_type,
                   post_id, uploaded_by, download_count, created_at, updated_at
            FROM files WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    /// Fetch a file with uploader and post display fields.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    pub async fn get_record(&self, id: i64) -> Result<Option<FileRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, FileRecord>(&format!(
            "{} WHERE f.id = $1",
            FILE_RECORD_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// List files newest first, optionally filtered to one post. Returns the
    /// page of records plus the unfiltered total for pagination.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    pub async fn list(
        &self,
        params: PageParams,
        post_id: Option<i64>,
    ) -> Result<(Vec<FileRecord>, i64), AppError> {
        let records = sqlx::query_as::<Postgres, FileRecord>(&format!(
            r#"
            {}
            WHERE ($1::bigint IS NULL OR f.post_id = $1)
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            FILE_RECORD_SELECT
        ))
        .bind(post_id)
        .bind(params.limit)
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM files f WHERE ($1::bigint IS NULL OR f.post_id = $1)",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((records, total))
    }

    /// Re-attach or detach the owning post.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "update", db.record_id = %id))]
    pub async fn set_post(&self, id: i64, post_id: Option<i64>) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE files SET post_id = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Atomic counter bump; the counter is informational, so callers treat a
    /// failure here as non-fatal.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "update", db.record_id = %id))]
    pub async fn increment_download_count(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE files SET download_count = download_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
