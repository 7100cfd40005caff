//! # inkwell-api
//!
//! Shared API types for the inkwell blog service.
//! The crate has no server dependencies so a client can reuse the same
//! request and response shapes.
//!
//! ## Features
//!
//! - Request DTOs (`RegisterRequest`, `LoginForm`, `CreatePostRequest`, ...)
//! - Response DTOs (`TokenResponse`, `PostResponse`, `PaginatedPostsResponse`, ...)
//! - Error response format (`ErrorResponse`)
//! - Generic response wrapper (`AppResponse`)
//!
//! ## Example
//!
//! ```rust
//! use inkwell_api::CreatePostRequest;
//!
//! let request = CreatePostRequest {
//!     title: "Hello".to_string(),
//!     content: "First post".to_string(),
//!     image_str: Some("https://example.com/cat.png".to_string()),
//!     image_b64: None,
//! };
//! assert!(request.image_b64.is_none());
//! ```

pub mod error;
pub mod requests;
pub mod responses;
pub mod result;

pub use error::ErrorResponse;
pub use requests::*;
pub use responses::*;
pub use result::{AppResponse, StatusCode};
