use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::user::User;

pub const ACCESS_TOKEN_MINUTES: i64 = 60;
pub const REFRESH_TOKEN_DAYS: i64 = 7;

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Signing secret is not configured")]
    MissingSecret,
    #[error("Token generation failed: {0}")]
    GenerationFailed(jsonwebtoken::errors::Error),
    #[error("Token verification failed: {0}")]
    VerificationFailed(jsonwebtoken::errors::Error),
    #[error("Token expired")]
    Expired,
    #[error("Unexpected token type")]
    WrongKind,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub last_name: Option<String>,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub typ: TokenKind,
}

#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtManager {
    pub fn new(secret: &str) -> Result<Self, JwtError> {
        Self::with_lifetimes(
            secret,
            Duration::minutes(ACCESS_TOKEN_MINUTES),
            Duration::days(REFRESH_TOKEN_DAYS),
        )
    }

    pub fn with_lifetimes(
        secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::MissingSecret);
        }

        // `exp` is checked by hand in `verify_token`, without leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn generate_access_token(&self, user: &User) -> Result<String, JwtError> {
        self.generate_token(user, TokenKind::Access, self.access_ttl)
    }

    pub fn generate_refresh_token(&self, user: &User) -> Result<String, JwtError> {
        self.generate_token(user, TokenKind::Refresh, self.refresh_ttl)
    }

    pub fn generate_token(
        &self,
        user: &User,
        kind: TokenKind,
        expires_in: Duration,
    ) -> Result<String, JwtError> {
        let now = Utc::now();

        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            last_name: user.last_name.clone(),
            exp: (now + expires_in).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            typ: kind,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(JwtError::GenerationFailed)
    }

    /// Checks signature and expiry, in that order.
    pub fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(JwtError::VerificationFailed)?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }

    pub fn verify_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, JwtError> {
        let claims = self.verify_token(token)?;
        if claims.typ != kind {
            return Err(JwtError::WrongKind);
        }
        Ok(claims)
    }
}
