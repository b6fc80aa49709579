use crate::auth::models::UserContext;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use inkpress_core::AppError;
use std::sync::Arc;

/// Resolve the request identity from the Authorization header.
///
/// Requests without a bearer credential continue anonymously; protected
/// handlers reject them when they fail to extract a [UserContext]. A bearer
/// credential that is present but invalid fails the request outright.
///
/// The user row is re-read on every request. There is deliberately no
/// session cache: a role change must be visible on the very next request.
pub async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => return next.run(request).await,
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    let claims = match state.jwt.verify(token) {
        Ok(claims) => claims,
        Err(err) => return HttpAppError(err).into_response(),
    };

    // Claims only bootstrap the lookup; role and existence come from the row.
    let user = match state.users.get_by_id(claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpAppError(AppError::Unauthorized("User not found".to_string()))
                .into_response()
        }
        Err(err) => return HttpAppError(err).into_response(),
    };

    request.extensions_mut().insert(UserContext {
        user_id: user.id,
        username: user.username,
        role: user.role,
    });

    next.run(request).await
}
