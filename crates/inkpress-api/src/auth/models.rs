use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use inkpress_core::{models::Role, AppError};

/// Authenticated identity resolved by the middleware and stored in request
/// extensions. The fields come from the user row re-read on this request,
/// not from token claims.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl UserContext {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Guard for admin-only operations.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}

// Extract directly from request parts so handlers taking Multipart can still
// receive the context (Extension cannot be combined with Multipart).
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserContext>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: "Authentication required".to_string(),
                        code: "UNAUTHORIZED".to_string(),
                        details: None,
                    }),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(role: Role) -> UserContext {
        UserContext {
            user_id: 1,
            username: "alex".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(context(Role::Admin).require_admin().is_ok());
        let err = context(Role::User).require_admin().unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
