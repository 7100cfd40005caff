// src/handlers/media.rs

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::error::AppError;
use crate::media::blob_store::SignedUrlParams;
use crate::posts::services::PostService;

/// GET /media/{bucket}/{key}?expires&nonce&signature
/// Serves an object of the bucket to holders of a valid signed URL.
pub async fn get_object(
    State(posts): State<Arc<PostService>>,
    Path((bucket, key)): Path<(String, String)>,
    params: Result<Query<SignedUrlParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let store = posts.media().store();
    if bucket != store.bucket() {
        return Err(AppError::not_found("object not found"));
    }

    let Query(params) = params.map_err(|_| AppError::forbidden("Missing or malformed signature"))?;
    store.verify_signed(&key, &params)?;

    let (data, meta) = store
        .get_object(&key)
        .await?
        .ok_or_else(|| AppError::not_found("object not found"))?;

    let content_type = HeaderValue::from_str(&meta.content_type)
        .map_err(|_| AppError::internal(format!("Stored content type is not a header value: {}", meta.content_type)))?;

    Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}
