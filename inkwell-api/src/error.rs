use serde::{Deserialize, Serialize};

/// Body of every non-2xx answer: a stable machine-readable code plus a
/// message meant for people.
///
/// ```rust
/// use inkwell_api::ErrorResponse;
///
/// let body = ErrorResponse::new("NOT_FOUND", "post not found");
/// assert_eq!(body.error, "NOT_FOUND");
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
