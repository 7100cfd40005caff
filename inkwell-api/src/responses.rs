use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Access/refresh token pair returned by register, login and refresh.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PostResponse {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub user_id: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Post detail enriched with its author.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PostWithUserResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub user: UserResponse,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PaginatedPostsResponse {
    pub data: Vec<PostResponse>,
    pub total: i64,
    pub total_pages: i64,
    pub page: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageResponse {
    pub message: String,
}
