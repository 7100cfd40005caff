// src/app.rs

use axum::{
    Router,
    extract::FromRef,
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::services::AuthService;
use crate::handlers::auth::{current_user, login, logout, refresh_token, register};
use crate::handlers::health::health;
use crate::handlers::media::get_object;
use crate::handlers::posts::{
    create_post, create_post_with_file, delete_post, get_post, list_all_posts, list_own_posts,
    update_post, update_post_with_file,
};
use crate::posts::services::PostService;

/// Services shared by every request, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub posts: Arc<PostService>,
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for Arc<PostService> {
    fn from_ref(state: &AppState) -> Self {
        state.posts.clone()
    }
}

/// Register, login, token refresh and the caller's profile.
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh_token", post(refresh_token))
        .route("/logout", get(logout))
        .route("/current_user", get(current_user))
}

fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post).get(list_own_posts))
        .route("/posts/image-file", post(create_post_with_file))
        .route(
            "/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/posts/{id}/image-file", put(update_post_with_file))
        .route("/posts-all", get(list_all_posts))
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origin = match HeaderValue::from_str(frontend_url) {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(_) => {
            tracing::warn!(frontend_url, "FRONTEND_URL is not a valid origin, allowing none");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn build_router(state: AppState, frontend_url: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", auth_routes().merge(post_routes()))
        .route("/media/{bucket}/{key}", get(get_object))
        .with_state(state)
        .layer(cors_layer(frontend_url))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{JwtManager, tests::sample_user};
    use crate::auth::tokens::TokenService;
    use crate::db::connection::unreachable_pool;
    use crate::media::blob_store::tests::temp_store;
    use crate::media::resolver::MediaResolver;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use lambda_http::tower::ServiceExt; // for oneshot

    const SECRET: &str = "test_secret_for_router";

    async fn test_app(dir: &tempfile::TempDir) -> (Router, Arc<PostService>) {
        let pool = unreachable_pool();
        let tokens = TokenService::new(JwtManager::new(SECRET).unwrap());
        let media = MediaResolver::new(temp_store(dir).await, chrono::Duration::minutes(5));
        let posts = Arc::new(PostService::new(pool.clone(), media, 3));
        let state = AppState {
            auth: Arc::new(AuthService::new(pool, tokens)),
            posts: posts.clone(),
        };
        (build_router(state, "http://localhost:8080"), posts)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn error_code(resp: axum::response::Response) -> String {
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        json["error"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir).await;

        let resp = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn current_user_requires_bearer() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir).await;

        let resp = app.oneshot(get_request("/api/current_user")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(resp).await, "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir).await;

        let req = Request::builder()
            .uri("/api/posts")
            .header("Authorization", "Bearer not.a.token")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_token_is_not_an_access_token() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir).await;
        let refresh = JwtManager::new(SECRET)
            .unwrap()
            .generate_refresh_token(&sample_user(1))
            .unwrap();

        let req = Request::builder()
            .uri("/api/logout")
            .header("Authorization", format!("Bearer {refresh}"))
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir).await;
        let forged = JwtManager::new("some_other_secret")
            .unwrap()
            .generate_access_token(&sample_user(1))
            .unwrap();

        let req = Request::builder()
            .uri("/api/current_user")
            .header("Authorization", format!("Bearer {forged}"))
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn page_zero_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir).await;

        let resp = app.oneshot(get_request("/api/posts-all?page=0")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(resp).await, "BAD_REQUEST");
    }

    #[tokio::test]
    async fn non_numeric_page_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir).await;

        let resp = app
            .oneshot(get_request("/api/posts-all?page=first"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn non_numeric_post_id_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir).await;

        let resp = app.oneshot(get_request("/api/posts/abc")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(resp.headers()["content-type"], "application/json");
        assert_eq!(error_code(resp).await, "INVALID_INPUT");
    }

    #[tokio::test]
    async fn delete_with_non_numeric_id_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir).await;
        let access = JwtManager::new(SECRET)
            .unwrap()
            .generate_access_token(&sample_user(1))
            .unwrap();

        let req = Request::builder()
            .uri("/api/posts/1.5")
            .method("DELETE")
            .header("Authorization", format!("Bearer {access}"))
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error_code(resp).await, "INVALID_INPUT");
    }

    #[tokio::test]
    async fn register_rejects_malformed_email() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir).await;

        let req = Request::builder()
            .uri("/api/register")
            .method("POST")
            .header("Content-Type", "application/json")
            .body(Body::from(
                r#"{"email":"not-an-email","password":"pw1","name":"Ann"}"#,
            ))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error_code(resp).await, "INVALID_INPUT");
    }

    #[tokio::test]
    async fn login_without_password_field_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir).await;

        let req = Request::builder()
            .uri("/api/login")
            .method("POST")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from("username=a%40b.com"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn media_serves_signed_object_with_its_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let (app, posts) = test_app(&dir).await;
        let store = posts.media().store();
        store.put_object("pic.png", b"hello", "image/png").await.unwrap();

        let signed = store.presign_get("pic.png", chrono::Duration::minutes(1));
        let path = signed.trim_start_matches("http://localhost:3000");

        let resp = app.oneshot(get_request(path)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "image/png");
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn media_with_bad_signature_is_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let (app, posts) = test_app(&dir).await;
        posts
            .media()
            .store()
            .put_object("pic.png", b"hello", "image/png")
            .await
            .unwrap();

        let expires = chrono::Utc::now().timestamp() + 60;
        let uri = format!(
            "/media/test-bucket/pic.png?expires={expires}&nonce=abc&signature=deadbeef"
        );
        let resp = app.oneshot(get_request(&uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn media_without_signature_is_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir).await;

        let resp = app
            .oneshot(get_request("/media/test-bucket/pic.png"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn media_in_unknown_bucket_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&dir).await;

        let resp = app
            .oneshot(get_request("/media/other-bucket/pic.png"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
