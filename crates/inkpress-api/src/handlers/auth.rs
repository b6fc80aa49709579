//! Account routes: login, registration, profile, password change.

use crate::auth::models::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::MessageResponse;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use inkpress_core::{
    models::{
        AdminRegisterRequest, AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest,
        Role, UserResponse,
    },
    AppError,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

const BCRYPT_COST: u32 = 12;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserCountResponse {
    #[serde(rename = "totalUsers")]
    pub total_users: i64,
}

/// bcrypt is CPU-bound; hash off the async worker threads.
async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Hash task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Hash task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, body), fields(operation = "login"))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    body.validate().map_err(AppError::from)?;

    // Same refusal for unknown email and wrong password
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let user = state
        .users
        .get_by_email(&body.email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(body.password, user.password_hash.clone()).await? {
        return Err(invalid().into());
    }

    let token = state.jwt.issue(user.id, &user.username, user.role)?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(AuthResponse {
        user: UserResponse::from(user),
        token,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Email or username already exists", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, body), fields(operation = "register"))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    body.validate().map_err(AppError::from)?;

    let username = body
        .username
        .clone()
        .unwrap_or_else(|| body.email.split('@').next().unwrap_or_default().to_string());

    if state.users.identity_taken(&username, &body.email).await? {
        return Err(AppError::Conflict("Email or username already exists".to_string()).into());
    }

    let password_hash = hash_password(body.password).await?;
    let user = state
        .users
        .create(&username, &body.email, &password_hash, Role::User)
        .await?;

    let token = state.jwt.issue(user.id, &user.username, user.role)?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserResponse::from(user),
            token,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/admin-register",
    tag = "auth",
    request_body = AdminRegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Email or username already exists", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, body), fields(user_id = ctx.user_id, operation = "admin_register"))]
pub async fn admin_register(
    State(state): State<Arc<AppState>>,
    ctx: UserContext,
    ValidatedJson(body): ValidatedJson<AdminRegisterRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    ctx.require_admin()?;
    body.validate().map_err(AppError::from)?;

    if state
        .users
        .identity_taken(&body.username, &body.email)
        .await?
    {
        return Err(AppError::Conflict("Email or username already exists".to_string()).into());
    }

    let password_hash = hash_password(body.password).await?;
    let user = state
        .users
        .create(
            &body.username,
            &body.email,
            &password_hash,
            body.role.unwrap_or(Role::User),
        )
        .await?;

    tracing::info!(created_user_id = user.id, "User created by admin");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = ctx.user_id, operation = "profile"))]
pub async fn profile(
    State(state): State<Arc<AppState>>,
    ctx: UserContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = state
        .users
        .get_by_id(ctx.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/api/auth/change-password",
    tag = "auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Current password is incorrect", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, body), fields(user_id = ctx.user_id, operation = "change_password"))]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    ctx: UserContext,
    ValidatedJson(body): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    body.validate().map_err(AppError::from)?;

    let user = state
        .users
        .get_by_id(ctx.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if !verify_password(body.current_password, user.password_hash.clone()).await? {
        return Err(AppError::InvalidInput("Current password is incorrect".to_string()).into());
    }

    let password_hash = hash_password(body.new_password).await?;
    state.users.update_password(ctx.user_id, &password_hash).await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

#[utoipa::path(
    get,
    path = "/api/auth/users/count",
    tag = "auth",
    responses(
        (status = 200, description = "Total registered users", body = UserCountResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "users_count"))]
pub async fn users_count(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let total_users = state.users.count().await?;
    Ok(Json(UserCountResponse { total_users }))
}
