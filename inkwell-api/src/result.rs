use serde::{Deserialize, Serialize};

/// Success statuses the API answers with, independent of any HTTP crate.
/// Errors carry their own status through `ErrorResponse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    Ok = 200,
    Created = 201,
}

impl StatusCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Generic API response wrapper
///
/// The server wraps this in a type that implements Axum's `IntoResponse`.
///
/// # Examples
///
/// ```rust
/// use inkwell_api::{AppResponse, StatusCode};
///
/// let response = AppResponse::created("post");
/// assert_eq!(response.status, StatusCode::Created);
/// assert_eq!(response.data, "post");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppResponse<T> {
    pub data: T,
    pub status: StatusCode,
}

impl<T> AppResponse<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        Self { status, data }
    }

    /// 200 OK with data
    pub fn ok(data: T) -> Self {
        Self::new(StatusCode::Ok, data)
    }

    /// 201 Created with data
    pub fn created(data: T) -> Self {
        Self::new(StatusCode::Created, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    struct Draft {
        title: String,
    }

    #[test]
    fn ok_response_carries_data() {
        let draft = Draft {
            title: "hello".to_string(),
        };
        let response = AppResponse::ok(draft.clone());
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.data, draft);
    }

    #[test]
    fn status_code_numeric_values() {
        assert_eq!(StatusCode::Ok.as_u16(), 200);
        assert_eq!(StatusCode::Created.as_u16(), 201);
    }
}
