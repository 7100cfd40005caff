// src/handlers/posts.rs

use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use inkwell_api::{
    CreatePostRequest, ListPostsQuery, PaginatedPostsResponse, PostResponse, PostWithUserResponse,
    UpdatePostRequest,
};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::auth::extractors::AuthUser;
use crate::error::AppError;
use crate::media::resolver::{ImageSource, UploadedFile};
use crate::posts::services::{PostDraft, PostService};
use crate::response::AppResponse;

const IMAGE_FILE_FIELD: &str = "image_file";

/// POST /api/posts
/// JSON body; the image is a reference (`image_str`) or inline data (`image_b64`).
pub async fn create_post(
    user: AuthUser,
    State(service): State<Arc<PostService>>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<AppResponse<PostResponse>, AppError> {
    let Json(request) = payload?;
    let image = ImageSource::select(request.image_str, request.image_b64, None);
    let draft = PostDraft {
        title: request.title,
        content: request.content,
    };

    let post = service.create(&user, draft, image).await?;
    Ok(AppResponse::created(post))
}

/// POST /api/posts/image-file
/// Multipart form with `title`, `content` and the `image_file` upload.
pub async fn create_post_with_file(
    user: AuthUser,
    State(service): State<Arc<PostService>>,
    multipart: Multipart,
) -> Result<AppResponse<PostResponse>, AppError> {
    let mut form = PostForm::read(multipart).await?;
    let draft = PostDraft {
        title: form.take_required("title")?,
        content: form.take_required("content")?,
    };
    let file = form.require_file()?;

    let post = service
        .create(&user, draft, Some(ImageSource::Upload(file)))
        .await?;
    Ok(AppResponse::created(post))
}

/// GET /api/posts
pub async fn list_own_posts(
    user: AuthUser,
    State(service): State<Arc<PostService>>,
) -> Result<AppResponse<Vec<PostResponse>>, AppError> {
    let posts = service.list_own(user.id)?;
    Ok(AppResponse::ok(posts))
}

/// GET /api/posts/{id}
pub async fn get_post(
    State(service): State<Arc<PostService>>,
    post_id: Result<Path<i32>, PathRejection>,
) -> Result<AppResponse<PostWithUserResponse>, AppError> {
    let Path(post_id) = post_id?;
    let post = service.detail(post_id)?;
    Ok(AppResponse::ok(post))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    user: AuthUser,
    State(service): State<Arc<PostService>>,
    post_id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Result<AppResponse<PostResponse>, AppError> {
    let Path(post_id) = post_id?;
    let Json(request) = payload?;
    let image = ImageSource::select(request.image_str, request.image_b64, None);

    let post = service
        .update(post_id, &user, request.fields, image)
        .await?;
    Ok(AppResponse::ok(post))
}

/// PUT /api/posts/{id}/image-file
pub async fn update_post_with_file(
    user: AuthUser,
    State(service): State<Arc<PostService>>,
    post_id: Result<Path<i32>, PathRejection>,
    multipart: Multipart,
) -> Result<AppResponse<PostResponse>, AppError> {
    let Path(post_id) = post_id?;
    let mut form = PostForm::read(multipart).await?;
    let file = form.require_file()?;

    let post = service
        .update(post_id, &user, form.fields, Some(ImageSource::Upload(file)))
        .await?;
    Ok(AppResponse::ok(post))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    user: AuthUser,
    State(service): State<Arc<PostService>>,
    post_id: Result<Path<i32>, PathRejection>,
) -> Result<AppResponse<&'static str>, AppError> {
    let Path(post_id) = post_id?;
    service.delete(post_id, &user)?;
    Ok(AppResponse::ok("Post deleted"))
}

/// GET /api/posts-all?page&search
pub async fn list_all_posts(
    State(service): State<Arc<PostService>>,
    query: Result<Query<ListPostsQuery>, QueryRejection>,
) -> Result<AppResponse<PaginatedPostsResponse>, AppError> {
    let Query(query) = query?;
    let page = service.list_all(query.page, query.search.as_deref())?;
    Ok(AppResponse::ok(page))
}

/// Text fields and the optional upload of a multipart post form.
#[derive(Debug, Default)]
struct PostForm {
    fields: Map<String, Value>,
    file: Option<UploadedFile>,
}

impl PostForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == IMAGE_FILE_FIELD {
                form.file = Some(Self::read_file(field).await?);
            } else {
                let text = field.text().await?;
                form.fields.insert(name, Value::String(text));
            }
        }

        Ok(form)
    }

    async fn read_file(field: Field<'_>) -> Result<UploadedFile, AppError> {
        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::validation("Uploaded image has no file name"))?;
        let data = field.bytes().await?;

        tracing::debug!(file_name, size = data.len(), "Received image upload");
        Ok(UploadedFile { file_name, data })
    }

    fn take_required(&mut self, name: &str) -> Result<String, AppError> {
        match self.fields.remove(name) {
            Some(Value::String(text)) => Ok(text),
            _ => Err(AppError::invalid_input(format!("Field '{name}' is required"))),
        }
    }

    fn require_file(&mut self) -> Result<UploadedFile, AppError> {
        self.file
            .take()
            .ok_or_else(|| AppError::invalid_input(format!("Field '{IMAGE_FILE_FIELD}' is required")))
    }
}
