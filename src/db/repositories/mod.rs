pub mod post_repository;
pub mod refresh_token_repository;
pub mod user_repository;
