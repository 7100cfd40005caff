// src/handlers/auth.rs

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::State;
use axum::{Form, Json};
use inkwell_api::{LoginForm, MessageResponse, RegisterRequest, TokenResponse, UserResponse};
use std::sync::Arc;

use crate::auth::extractors::{AuthUser, BearerToken};
use crate::auth::services::AuthService;
use crate::error::AppError;
use crate::response::AppResponse;

/// POST /api/register
pub async fn register(
    State(service): State<Arc<AuthService>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<AppResponse<TokenResponse>, AppError> {
    let Json(request) = payload?;
    let tokens = service.register(request)?;
    Ok(AppResponse::created(tokens))
}

/// POST /api/login
/// Password-flow form: `username` holds the email.
pub async fn login(
    State(service): State<Arc<AuthService>>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<AppResponse<TokenResponse>, AppError> {
    let Form(form) = form?;
    let tokens = service.login(&form.username, &form.password)?;
    Ok(AppResponse::ok(tokens))
}

/// POST /api/refresh_token
/// The bearer here is the refresh token, not an access token.
pub async fn refresh_token(
    State(service): State<Arc<AuthService>>,
    BearerToken(token): BearerToken,
) -> Result<AppResponse<TokenResponse>, AppError> {
    let tokens = service.refresh(&token)?;
    Ok(AppResponse::ok(tokens))
}

/// GET /api/logout
pub async fn logout(
    user: AuthUser,
    State(service): State<Arc<AuthService>>,
) -> Result<AppResponse<MessageResponse>, AppError> {
    service.logout(user.id)?;
    tracing::info!(user_id = user.id, "User logged out");
    Ok(AppResponse::ok(MessageResponse {
        message: "Successfully logged out".to_string(),
    }))
}

/// GET /api/current_user
pub async fn current_user(
    user: AuthUser,
    State(service): State<Arc<AuthService>>,
) -> Result<AppResponse<UserResponse>, AppError> {
    let profile = service.current_user(user.id)?;
    Ok(AppResponse::ok(profile))
}
