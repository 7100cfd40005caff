// src/error.rs

use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use inkwell_api::ErrorResponse;

use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::db::error::RepositoryError;
use crate::media::blob_store::BlobStoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // === Ressources ===
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    DuplicateResource(String),

    // === Authentification / autorisation ===
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),

    // === Validation ===
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Page out of range: {0}")]
    PageOutOfRange(String),

    // === Persistance ===
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Database error: {0}")]
    DatabaseError(String),

    // === Erreurs internes ===
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Password hashing failed: {0}")]
    PasswordHashingFailed(String),
    #[error("Token generation failed: {0}")]
    TokenGenerationFailed(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, internal_detail) = self.get_error_info();

        if let Some(ref detail) = internal_detail {
            tracing::error!(error_code, %status, detail, "Internal server error");
        }

        let body = Json(ErrorResponse::new(error_code, message));

        (status, body).into_response()
    }
}

impl AppError {
    fn get_error_info(&self) -> (StatusCode, &'static str, String, Option<String>) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::DuplicateResource(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "DUPLICATE_RESOURCE",
                msg.clone(),
                None,
            ),

            AppError::InvalidCredentials(msg) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                msg.clone(),
                None,
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone(), None),

            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::InvalidInput(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_INPUT",
                msg.clone(),
                None,
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            AppError::PageOutOfRange(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "PAGE_OUT_OF_RANGE",
                msg.clone(),
                None,
            ),

            AppError::Persistence(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "PERSISTENCE_ERROR",
                format!("Error: {msg}"),
                None,
            ),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "An error occurred with the database".to_string(),
                Some(msg.clone()),
            ),
            AppError::ConfigError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                "The server is misconfigured".to_string(),
                Some(msg.clone()),
            ),
            AppError::PasswordHashingFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "HASHING_ERROR",
                "An error occurred while processing your request".to_string(),
                Some(msg.clone()),
            ),
            AppError::TokenGenerationFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "TOKEN_ERROR",
                "An error occurred while generating token".to_string(),
                Some(msg.clone()),
            ),
            AppError::InternalServerError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal server error occurred".to_string(),
                Some(msg.clone()),
            ),
        }
    }

    // === Constructeurs helpers ===
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn email_taken() -> Self {
        AppError::DuplicateResource("Email already registered".to_string())
    }

    pub fn invalid_credentials(msg: impl Into<String>) -> Self {
        AppError::InvalidCredentials(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        AppError::InvalidInput(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn page_out_of_range(msg: impl Into<String>) -> Self {
        AppError::PageOutOfRange(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::InternalServerError(msg.into())
    }

    #[cfg(test)]
    pub fn status_code(&self) -> StatusCode {
        self.get_error_info().0
    }
}

// === Conversions automatiques depuis d'autres types d'erreurs ===

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
            RepositoryError::UniqueViolation(msg) => AppError::DuplicateResource(msg),
            RepositoryError::PoolError(msg) => AppError::DatabaseError(msg),
            RepositoryError::ForeignKeyViolation(msg) | RepositoryError::DatabaseError(msg) => {
                AppError::Persistence(msg)
            }
        }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        AppError::from(RepositoryError::from(err))
    }
}

// Toute erreur de vérification devient InvalidCredentials, sans détail de signature.
impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::MissingSecret => AppError::ConfigError(err.to_string()),
            JwtError::GenerationFailed(e) => AppError::TokenGenerationFailed(e.to_string()),
            JwtError::VerificationFailed(_) | JwtError::Expired | JwtError::WrongKind => {
                AppError::invalid_credentials("Invalid or expired token")
            }
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::PasswordHashingFailed(err.to_string())
    }
}

impl From<BlobStoreError> for AppError {
    fn from(err: BlobStoreError) -> Self {
        match err {
            BlobStoreError::InvalidKey(_) => AppError::validation(err.to_string()),
            BlobStoreError::BadSignature | BlobStoreError::Expired => {
                AppError::forbidden(err.to_string())
            }
            BlobStoreError::Io(_) | BlobStoreError::Metadata(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::invalid_input(format!("Invalid JSON: {err}"))
    }
}

impl From<FormRejection> for AppError {
    fn from(err: FormRejection) -> Self {
        AppError::invalid_input(format!("Invalid form: {err}"))
    }
}

impl From<QueryRejection> for AppError {
    fn from(err: QueryRejection) -> Self {
        AppError::invalid_input(format!("Invalid query: {err}"))
    }
}

impl From<PathRejection> for AppError {
    fn from(err: PathRejection) -> Self {
        AppError::invalid_input(format!("Invalid path: {err}"))
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::validation(format!("Invalid image file: {err}"))
    }
}
