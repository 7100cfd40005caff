// src/posts/services.rs

use diesel::Connection;
use inkwell_api::{PaginatedPostsResponse, PostResponse, PostWithUserResponse, UserResponse};
use serde_json::{Map, Value};

use crate::auth::extractors::AuthUser;
use crate::db::DbPool;
use crate::db::connection::get_connection;
use crate::db::models::post::{NewPost, Post};
use crate::db::repositories::post_repository::PostRepository;
use crate::error::AppError;
use crate::media::resolver::{ImageSource, MediaResolver, StoredImage};
use crate::posts::guard::{apply_partial_update, authorize_mutation};
use crate::posts::pagination;

/// Title and body of a new post.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
}

pub struct PostService {
    pool: DbPool,
    media: MediaResolver,
    page_size: i64,
}

impl PostService {
    pub fn new(pool: DbPool, media: MediaResolver, page_size: i64) -> Self {
        Self {
            pool,
            media,
            page_size: page_size.max(1),
        }
    }

    pub fn media(&self) -> &MediaResolver {
        &self.media
    }

    pub async fn create(
        &self,
        owner: &AuthUser,
        draft: PostDraft,
        image: Option<ImageSource>,
    ) -> Result<PostResponse, AppError> {
        let stored = self.media.persist(image).await?;

        let new_post = NewPost {
            title: draft.title,
            content: draft.content,
            user_id: owner.id,
            image: stored.as_ref().map(|s| s.reference.clone()),
        };

        let result = get_connection(&self.pool)
            .map_err(AppError::from)
            .and_then(|mut conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    PostRepository::create(conn, &new_post).map_err(AppError::from)
                })
            });

        match result {
            Ok(post) => {
                tracing::info!(post_id = post.id, user_id = owner.id, "Post created");
                Ok(self.to_response(post))
            }
            Err(e) => {
                self.discard(stored.as_ref()).await;
                Err(e)
            }
        }
    }

    /// The caller's posts, newest first.
    pub fn list_own(&self, owner_id: i32) -> Result<Vec<PostResponse>, AppError> {
        let mut conn = get_connection(&self.pool)?;
        let posts = PostRepository::list_by_user(&mut conn, owner_id)?;
        Ok(posts.into_iter().map(|p| self.to_response(p)).collect())
    }

    /// Post with its author, fetched with one join.
    pub fn detail(&self, post_id: i32) -> Result<PostWithUserResponse, AppError> {
        let mut conn = get_connection(&self.pool)?;
        let (post, author) = PostRepository::find_with_author(&mut conn, post_id)?
            .ok_or_else(|| AppError::not_found("post not found"))?;

        Ok(PostWithUserResponse {
            post: self.to_response(post),
            user: UserResponse::from(author),
        })
    }

    /// Overwrites the allow-listed fields present in `fields` and, when an
    /// image input is given, the image. Ownership is checked before the
    /// image is stored and again under the row lock.
    pub async fn update(
        &self,
        post_id: i32,
        caller: &AuthUser,
        fields: Map<String, Value>,
        image: Option<ImageSource>,
    ) -> Result<PostResponse, AppError> {
        {
            let mut conn = get_connection(&self.pool)?;
            authorize_mutation(PostRepository::find_by_id(&mut conn, post_id)?, caller.id)?;
        }

        let stored = self.media.persist(image).await?;
        let new_image = stored.as_ref().map(|s| s.reference.clone());

        let result = get_connection(&self.pool)
            .map_err(AppError::from)
            .and_then(|mut conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    let locked = PostRepository::find_by_id_for_update(conn, post_id)?;
                    let mut post = authorize_mutation(locked, caller.id)?;
                    apply_partial_update(&mut post, &fields, new_image)?;
                    PostRepository::update(conn, &post).map_err(AppError::from)
                })
            });

        match result {
            Ok(post) => {
                tracing::info!(post_id, user_id = caller.id, "Post updated");
                Ok(self.to_response(post))
            }
            Err(e) => {
                self.discard(stored.as_ref()).await;
                Err(e)
            }
        }
    }

    pub fn delete(&self, post_id: i32, caller: &AuthUser) -> Result<(), AppError> {
        let mut conn = get_connection(&self.pool)?;
        conn.transaction::<_, AppError, _>(|conn| {
            let locked = PostRepository::find_by_id_for_update(conn, post_id)?;
            authorize_mutation(locked, caller.id)?;
            PostRepository::delete(conn, post_id)?;
            Ok(())
        })?;

        tracing::info!(post_id, user_id = caller.id, "Post deleted");
        Ok(())
    }

    /// Public listing across all users. `page` defaults to 1.
    pub fn list_all(
        &self,
        page: Option<i64>,
        search: Option<&str>,
    ) -> Result<PaginatedPostsResponse, AppError> {
        let page = page.unwrap_or(1);
        pagination::validate_page_number(page)?;

        let mut conn = get_connection(&self.pool)?;
        let page = pagination::list(&mut conn, page, self.page_size, search)?;

        Ok(PaginatedPostsResponse {
            data: page.data.into_iter().map(|p| self.to_response(p)).collect(),
            total: page.total,
            total_pages: page.total_pages,
            page: page.page,
        })
    }

    fn to_response(&self, post: Post) -> PostResponse {
        PostResponse {
            image: self.media.resolve_for_display(post.image.as_deref()),
            id: post.id,
            title: post.title,
            content: post.content,
            user_id: post.user_id,
            created_at: post.created_at,
        }
    }

    async fn discard(&self, stored: Option<&StoredImage>) {
        if let Some(stored) = stored {
            self.media.discard(stored).await;
        }
    }
}
