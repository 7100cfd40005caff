//! Token lifecycle: short-lived access tokens, one long-lived refresh token
//! per user that is reused on every login until it is rotated or revoked.

use diesel::PgConnection;

use crate::auth::jwt::{Claims, JwtManager, TokenKind};
use crate::db::models::refresh_token::NewRefreshToken;
use crate::db::models::user::User;
use crate::db::repositories::refresh_token_repository::RefreshTokenRepository;
use crate::db::repositories::user_repository::UserRepository;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenService {
    jwt: JwtManager,
}

impl TokenService {
    pub fn new(jwt: JwtManager) -> Self {
        Self { jwt }
    }

    pub fn issue_access_token(&self, user: &User) -> Result<String, AppError> {
        self.jwt.generate_access_token(user).map_err(AppError::from)
    }

    /// Returns the stored refresh token when one exists, otherwise mints and
    /// stores a new one. The stored token's embedded expiry is not checked
    /// here; that happens when it is presented for rotation.
    pub fn issue_or_reuse_refresh_token(
        &self,
        conn: &mut PgConnection,
        user: &User,
    ) -> Result<String, AppError> {
        if let Some(existing) = RefreshTokenRepository::find_by_user(conn, user.id)? {
            tracing::debug!(user_id = user.id, "Reusing stored refresh token");
            return Ok(existing.refresh_token);
        }

        let minted = self.jwt.generate_refresh_token(user)?;
        let stored = RefreshTokenRepository::insert_if_absent(
            conn,
            &NewRefreshToken {
                user_id: user.id,
                refresh_token: &minted,
            },
        )?;
        Ok(stored.refresh_token)
    }

    pub fn issue_pair(&self, conn: &mut PgConnection, user: &User) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user)?,
            refresh_token: self.issue_or_reuse_refresh_token(conn, user)?,
        })
    }

    /// Verifies an access token. Any failure is reported as invalid credentials.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AppError> {
        self.jwt
            .verify_kind(token, TokenKind::Access)
            .map_err(AppError::from)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        self.jwt
            .verify_kind(token, TokenKind::Refresh)
            .map_err(AppError::from)
    }

    /// Replaces the stored refresh token of `user_id` after checking that the
    /// presented token is byte-equal to it. Must run inside a transaction.
    pub fn rotate_refresh_token(
        &self,
        conn: &mut PgConnection,
        user_id: i32,
        presented: &str,
    ) -> Result<TokenPair, AppError> {
        let stored = RefreshTokenRepository::find_by_user_for_update(conn, user_id)?
            .ok_or_else(|| AppError::invalid_credentials("No active refresh token"))?;

        if !matches_stored(&stored.refresh_token, presented) {
            tracing::warn!(user_id, "Presented refresh token does not match stored token");
            return Err(AppError::invalid_credentials("Refresh token mismatch"));
        }

        let user = UserRepository::find_by_id(conn, user_id)?
            .ok_or_else(|| AppError::invalid_credentials("User no longer exists"))?;

        let access_token = self.issue_access_token(&user)?;
        let refresh_token = self.jwt.generate_refresh_token(&user)?;
        RefreshTokenRepository::replace_token(conn, user_id, &refresh_token)?;

        tracing::info!(user_id, "Refresh token rotated");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Deletes the user's refresh token; a no-op when there is none.
    pub fn revoke(conn: &mut PgConnection, user_id: i32) -> Result<(), AppError> {
        let removed = RefreshTokenRepository::delete_by_user(conn, user_id)?;
        tracing::debug!(user_id, removed, "Refresh token revoked");
        Ok(())
    }
}

/// A presented refresh token is only accepted when it is byte-equal to the
/// stored one; a validly signed but superseded token does not match.
fn matches_stored(stored: &str, presented: &str) -> bool {
    stored.as_bytes() == presented.as_bytes()
}
