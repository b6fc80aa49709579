use inkpress_core::{
    access::LedgerView,
    models::{DownloadRequest, DownloadRequestRecord, RequestStatus},
    AppError, PageParams,
};
use sqlx::{PgPool, Postgres};

/// Name of the partial unique index enforcing at most one pending request
/// per (user, file) pair. Concurrent creates race to this index instead of
/// an application-level check.
const ONE_PENDING_INDEX: &str = "download_requests_one_pending_per_user_file";

const REQUEST_COLUMNS: &str =
    "id, user_id, file_id, status, notes, request_date, approved_date, approved_by";

const REQUEST_RECORD_SELECT: &str = r#"
    SELECT
        dr.id, dr.user_id, dr.file_id, dr.status, dr.notes,
        dr.request_date, dr.approved_date, dr.approved_by,
        f.original_name AS file_name,
        f.file_size AS file_size,
        f.mime_type AS mime_type,
        p.title AS post_title,
        p.slug AS post_slug,
        u1.username AS requester_name,
        u2.username AS approver_name
    FROM download_requests dr
    LEFT JOIN files f ON dr.file_id = f.id
    LEFT JOIN posts p ON f.post_id = p.id
    LEFT JOIN users u1 ON dr.user_id = u1.id
    LEFT JOIN users u2 ON dr.approved_by = u2.id
"#;

/// Repository for the download-request ledger.
#[derive(Clone)]
pub struct DownloadRequestRepository {
    pool: PgPool,
}

impl DownloadRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new pending request. A second pending request for the same
    /// (user, file) pair violates the partial unique index and surfaces as
    /// `Conflict`, also under concurrent calls.
    #[tracing::instrument(skip(self, notes), fields(db.table = "download_requests", db.operation = "insert"))]
    pub async fn create(
        &self,
        user_id: i64,
        file_id: i64,
        notes: Option<&str>,
    ) -> Result<DownloadRequest, AppError> {
        let result = sqlx::query_as::<Postgres, DownloadRequest>(&format!(
            r#"
            INSERT INTO download_requests (user_id, file_id, notes)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        ))
        .bind(user_id)
        .bind(file_id)
        .bind(notes)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(request) => Ok(request),
            Err(sqlx::Error::Database(db_err))
                if db_err.constraint() == Some(ONE_PENDING_INDEX) =>
            {
                Err(AppError::Conflict(
                    "You already have a pending request for this file".to_string(),
                ))
            }
            Err(err) => Err(err.into()),
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "download_requests", db.operation = "select", db.record_id = %id))]
    pub async fn get_row(&self, id: i64) -> Result<Option<DownloadRequest>, AppError> {
        let request = sqlx::query_as::<Postgres, DownloadRequest>(&format!(
            "SELECT {} FROM download_requests WHERE id = $1",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// Fetch a request with file, post, requester, and approver display fields.
    #[tracing::instrument(skip(self), fields(db.table = "download_requests", db.operation = "select", db.record_id = %id))]
    pub async fn get_record(&self, id: i64) -> Result<Option<DownloadRequestRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, DownloadRequestRecord>(&format!(
            "{} WHERE dr.id = $1",
            REQUEST_RECORD_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// The requester's most recent request for a file, for the status poll.
    #[tracing::instrument(skip(self), fields(db.table = "download_requests", db.operation = "select"))]
    pub async fn latest_for(
        &self,
        user_id: i64,
        file_id: i64,
    ) -> Result<Option<DownloadRequest>, AppError> {
        let request = sqlx::query_as::<Postgres, DownloadRequest>(&format!(
            r#"
            SELECT {} FROM download_requests
            WHERE user_id = $1 AND file_id = $2
            ORDER BY request_date DESC
            LIMIT 1
            "#,
            REQUEST_COLUMNS
        ))
        .bind(user_id)
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// Collapse the requester's ledger history for a file into the flags the
    /// access decision needs. Always re-read: approval state may change
    /// between a poll and the next download attempt.
    #[tracing::instrument(skip(self), fields(db.table = "download_requests", db.operation = "select"))]
    pub async fn ledger_view(&self, user_id: i64, file_id: i64) -> Result<LedgerView, AppError> {
        let view = sqlx::query_as::<Postgres, LedgerView>(
            r#"
            SELECT
                COALESCE(bool_or(status = 'approved'), false) AS has_approved,
                COALESCE(bool_or(status = 'pending'), false) AS has_pending
            FROM download_requests
            WHERE user_id = $1 AND file_id = $2
            "#,
        )
        .bind(user_id)
        .bind(file_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(view)
    }

    /// One user's request history, newest first, optionally status-filtered.
    #[tracing::instrument(skip(self), fields(db.table = "download_requests", db.operation = "select"))]
    pub async fn list_for_user(
        &self,
        user_id: i64,
        status: Option<RequestStatus>,
        params: PageParams,
    ) -> Result<(Vec<DownloadRequestRecord>, i64), AppError> {
        let records = sqlx::query_as::<Postgres, DownloadRequestRecord>(&format!(
            r#"
            {}
            WHERE dr.user_id = $1 AND ($2::request_status IS NULL OR dr.status = $2)
            ORDER BY dr.request_date DESC
            LIMIT $3 OFFSET $4
            "#,
            REQUEST_RECORD_SELECT
        ))
        .bind(user_id)
        .bind(status)
        .bind(params.limit)
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT COUNT(*) FROM download_requests dr
            WHERE dr.user_id = $1 AND ($2::request_status IS NULL OR dr.status = $2)
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((records, total))
    }

    /// Admin view over all requests, newest first, optionally status-filtered.
    #[tracing::instrument(skip(self), fields(db.table = "download_requests", db.operation = "select"))]
    pub async fn list_all(
        &self,
        status: Option<RequestStatus>,
        params: PageParams,
    ) -> Result<(Vec<DownloadRequestRecord>, i64), AppError> {
        let records = sqlx::query_as::<Postgres, DownloadRequestRecord>(&format!(
            r#"
            {}
            WHERE ($1::request_status IS NULL OR dr.status = $1)
            ORDER BY dr.request_date DESC
            LIMIT $2 OFFSET $3
            "#,
            REQUEST_RECORD_SELECT
        ))
        .bind(status)
        .bind(params.limit)
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM download_requests dr WHERE ($1::request_status IS NULL OR dr.status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((records, total))
    }

    /// Apply an admin decision: status, approver, and decision timestamp are
    /// set together, and an absent note leaves the existing note in place.
    /// Returns false when the request does not exist.
    #[tracing::instrument(skip(self, notes), fields(db.table = "download_requests", db.operation = "update", db.record_id = %id))]
    pub async fn transition(
        &self,
        id: i64,
        status: RequestStatus,
        approver_id: i64,
        notes: Option<&str>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE download_requests
            SET status = $2,
                notes = COALESCE($3, notes),
                approved_date = now(),
                approved_by = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(notes)
        .bind(approver_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Hard delete; request history is not soft-deleted.
    #[tracing::instrument(skip(self), fields(db.table = "download_requests", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM download_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
