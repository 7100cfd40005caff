use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// -------- REQUEST DTOs --------
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String, // Plain text
    pub name: String,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// OAuth2 password-flow form: `username` carries the email.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_str: Option<String>,
    #[serde(default)]
    pub image_b64: Option<String>,
}

/// Partial post update. Any key other than the two image inputs lands in
/// `fields`; the server decides which of them are updatable.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub image_str: Option<String>,
    #[serde(default)]
    pub image_b64: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ListPostsQuery {
    pub page: Option<i64>,
    pub search: Option<String>,
}
