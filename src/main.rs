use std::env;
use std::sync::Arc;

mod app;
mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod media;
mod posts;
mod response;

use app::{AppState, build_router};
use auth::jwt::JwtManager;
use auth::services::AuthService;
use auth::tokens::TokenService;
use config::Config;
use media::blob_store::BlobStore;
use media::resolver::MediaResolver;
use posts::services::PostService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,inkwell=debug,hyper_util=warn,tower_http=info")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let pool = db::connection::create_pool(&config.database_url)?;

    let jwt = JwtManager::with_lifetimes(
        &config.jwt_secret,
        chrono::Duration::minutes(config.access_token_minutes),
        chrono::Duration::days(config.refresh_token_days),
    )?;

    let store = BlobStore::new(
        &config.media.root,
        &config.media.public_url,
        &config.media.bucket,
        config.media.signing_secret.as_bytes(),
    )
    .await?;
    let media = MediaResolver::new(
        store,
        chrono::Duration::seconds(config.media.signed_url_ttl_seconds),
    );

    Ok(AppState {
        auth: Arc::new(AuthService::new(pool.clone(), TokenService::new(jwt))),
        posts: Arc::new(PostService::new(pool, media, config.posts_page_size)),
    })
}

#[tokio::main]
async fn main() -> Result<(), lambda_http::Error> {
    setup_logging();
    tracing::info!("Starting inkwell...");

    let config = Config::from_env()?;
    let state = build_state(&config).await?;
    let app = build_router(state, &config.frontend_url);

    if env::var("AWS_LAMBDA_FUNCTION_NAME").is_ok() {
        tracing::info!("Running in Lambda mode");
        lambda_http::run(app).await
    } else {
        if config.is_production() {
            tracing::warn!("APP_ENV is production but no Lambda runtime detected");
        }
        let addr = format!("{}:{}", config.server_host, config.server_port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("Server running at http://{addr}");
        axum::serve(listener, app).await?;

        Ok(())
    }
}
