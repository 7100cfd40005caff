use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::app::AppState;
use crate::auth::jwt::Claims;
use crate::error::AppError;

const BEARER: &str = "Bearer ";

/// Raw token from `Authorization: Bearer <token>`, not yet verified.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_str = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::invalid_credentials("Not authenticated"))?
            .to_str()
            .map_err(|_| AppError::invalid_credentials("Invalid authorization header"))?;

        let token = auth_str
            .strip_prefix(BEARER)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::invalid_credentials("Invalid authorization header"))?;

        Ok(Self(token.to_string()))
    }
}

/// Identity of the caller, taken from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub last_name: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(c: Claims) -> Self {
        Self {
            id: c.id,
            email: c.email,
            name: c.name,
            last_name: c.last_name,
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let claims = state.auth.tokens().verify_access_token(&token)?;
        Ok(AuthUser::from(claims))
    }
}
