use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use validator::Validate;

/// Lifecycle state of a download request.
///
/// The lifecycle is pending -> approved or pending -> rejected, driven by an
/// admin through [RequestStatus::transition]. A rejected request does not
/// block the user from filing a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "request_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Status must be approved or rejected")]
    NotADecision,
}

impl RequestStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestStatus::Pending)
    }

    /// Apply an admin decision. Only `approved` and `rejected` are legal
    /// targets; re-deciding an already-finalized request overwrites the
    /// earlier decision (see DESIGN.md).
    pub fn transition(self, requested: RequestStatus) -> Result<RequestStatus, TransitionError> {
        match requested {
            RequestStatus::Pending => Err(TransitionError::NotADecision),
            decided => Ok(decided),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// One download-request row.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DownloadRequest {
    pub id: i64,
    pub user_id: i64,
    pub file_id: i64,
    pub status: RequestStatus,
    pub notes: Option<String>,
    pub request_date: DateTime<Utc>,
    pub approved_date: Option<DateTime<Utc>>,
    pub approved_by: Option<i64>,
}

/// Download-request row joined with file, post, and user display fields.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DownloadRequestRecord {
    pub id: i64,
    pub user_id: i64,
    pub file_id: i64,
    pub status: RequestStatus,
    pub notes: Option<String>,
    pub request_date: DateTime<Utc>,
    pub approved_date: Option<DateTime<Utc>>,
    pub approved_by: Option<i64>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub post_title: Option<String>,
    pub post_slug: Option<String>,
    pub requester_name: Option<String>,
    pub approver_name: Option<String>,
}

/// Body for POST /api/download-requests.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateDownloadRequest {
    #[serde(alias = "fileId")]
    pub file_id: i64,
    #[serde(default)]
    #[validate(length(max = 500, message = "Notes must be less than 500 characters"))]
    pub notes: Option<String>,
}

/// Body for PUT /api/download-requests/{id}.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateDownloadRequest {
    pub status: RequestStatus,
    #[serde(default)]
    #[validate(length(max = 500, message = "Notes must be less than 500 characters"))]
    pub notes: Option<String>,
}

/// Response for GET /api/download-requests/check/{file_id}: the requester's
/// most recent request for a file, if any.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestCheck {
    pub requested: bool,
    pub status: Option<RequestStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl RequestCheck {
    pub fn none() -> Self {
        RequestCheck {
            requested: false,
            status: None,
            request_id: None,
            created_at: None,
        }
    }

    pub fn from_request(request: &DownloadRequest) -> Self {
        RequestCheck {
            requested: true,
            status: Some(request.status),
            request_id: Some(request.id),
            created_at: Some(request.request_date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&RequestStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::from_str::<RequestStatus>("\"approved\"").unwrap(),
            RequestStatus::Approved
        );
        assert!(serde_json::from_str::<RequestStatus>("\"granted\"").is_err());
    }

    #[test]
    fn test_transition_to_decision() {
        assert_eq!(
            RequestStatus::Pending.transition(RequestStatus::Approved),
            Ok(RequestStatus::Approved)
        );
        assert_eq!(
            RequestStatus::Pending.transition(RequestStatus::Rejected),
            Ok(RequestStatus::Rejected)
        );
    }

    #[test]
    fn test_transition_back_to_pending_is_rejected() {
        for current in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
        ] {
            assert_eq!(
                current.transition(RequestStatus::Pending),
                Err(TransitionError::NotADecision)
            );
        }
    }

    #[test]
    fn test_finalized_request_can_be_redecided() {
        // Permissive overwrite: an approved request may later be rejected
        // (and vice versa), replacing the earlier decision.
        assert_eq!(
            RequestStatus::Approved.transition(RequestStatus::Rejected),
            Ok(RequestStatus::Rejected)
        );
        assert_eq!(
            RequestStatus::Rejected.transition(RequestStatus::Approved),
            Ok(RequestStatus::Approved)
        );
    }

    #[test]
    fn test_check_response_shape() {
        let none = serde_json::to_value(RequestCheck::none()).unwrap();
        assert_eq!(none["requested"], false);
        assert!(none["status"].is_null());
        assert!(none.get("requestId").is_none());

        let request = DownloadRequest {
            id: 12,
            user_id: 3,
            file_id: 9,
            status: RequestStatus::Pending,
            notes: None,
            request_date: Utc::now(),
            approved_date: None,
            approved_by: None,
        };
        let some = serde_json::to_value(RequestCheck::from_request(&request)).unwrap();
        assert_eq!(some["requested"], true);
        assert_eq!(some["status"], "pending");
        assert_eq!(some["requestId"], 12);
        assert!(some.get("createdAt").is_some());
    }
}
