use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use inkwell_api::{AppResponse as ApiResponse, StatusCode as ApiStatusCode};
use serde::Serialize;

/// Axum-facing wrapper around `inkwell_api::AppResponse`.
///
/// ```rust,ignore
/// AppResponse::created(post)
/// AppResponse::ok(page)
/// ```
pub struct AppResponse<T> {
    inner: ApiResponse<T>,
}

impl<T> AppResponse<T>
where
    T: Serialize,
{
    pub fn new(inner: ApiResponse<T>) -> Self {
        Self { inner }
    }

    /// 200 OK with data
    pub fn ok(data: T) -> Self {
        Self::new(ApiResponse::ok(data))
    }

    /// 201 Created with data
    pub fn created(data: T) -> Self {
        Self::new(ApiResponse::created(data))
    }
}

fn convert_status(api_status: ApiStatusCode) -> StatusCode {
    match api_status {
        ApiStatusCode::Ok => StatusCode::OK,
        ApiStatusCode::Created => StatusCode::CREATED,
    }
}

impl<T> IntoResponse for AppResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        (convert_status(self.inner.status), Json(self.inner.data)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use inkwell_api::MessageResponse;

    fn message(text: &str) -> MessageResponse {
        MessageResponse {
            message: text.to_string(),
        }
    }

    #[tokio::test]
    async fn created_response_carries_201_and_json_body() {
        let response = AppResponse::created(message("made")).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["content-type"], "application/json");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"message":"made"}"#);
    }

    #[test]
    fn bare_string_payload_is_a_json_string() {
        let response = AppResponse::ok("Post deleted").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/json");
    }

    #[test]
    fn status_conversion_covers_every_api_code() {
        assert_eq!(convert_status(ApiStatusCode::Ok), StatusCode::OK);
        assert_eq!(convert_status(ApiStatusCode::Created), StatusCode::CREATED);
    }
}
