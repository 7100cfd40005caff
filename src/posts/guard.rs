//! Single-owner authorization and partial-field merges for posts.

use serde_json::{Map, Value};

use crate::db::models::post::Post;
use crate::error::AppError;

/// Returns the post when `user_id` owns it.
pub fn authorize_mutation(post: Option<Post>, user_id: i32) -> Result<Post, AppError> {
    let post = post.ok_or_else(|| AppError::not_found("post not found"))?;
    if post.user_id != user_id {
        tracing::warn!(post_id = post.id, owner = post.user_id, user_id, "Mutation by non-owner refused");
        return Err(AppError::forbidden("Unauthorized"));
    }
    Ok(post)
}

/// Post attributes a client may overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostField {
    Title,
    Content,
}

impl PostField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "content" => Some(Self::Content),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Content => "content",
        }
    }

    fn set(self, post: &mut Post, value: String) {
        match self {
            Self::Title => post.title = value,
            Self::Content => post.content = value,
        }
    }
}

/// Overwrites the known fields present in `fields` and, when given, the
/// image. Unknown names are ignored. Nothing is modified if any known field
/// carries a non-string value.
pub fn apply_partial_update(
    post: &mut Post,
    fields: &Map<String, Value>,
    new_image: Option<String>,
) -> Result<(), AppError> {
    let mut updates = Vec::with_capacity(fields.len());
    for (name, value) in fields {
        let Some(field) = PostField::from_name(name) else {
            tracing::debug!(field = %name, "Ignoring unknown post field");
            continue;
        };
        let Value::String(text) = value else {
            return Err(AppError::invalid_input(format!(
                "Field '{}' must be a string",
                field.name()
            )));
        };
        updates.push((field, text.clone()));
    }

    for (field, value) in updates {
        field.set(post, value);
    }
    if let Some(image) = new_image {
        post.image = Some(image);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn post_owned_by(user_id: i32) -> Post {
        Post {
            id: 7,
            title: "original title".to_string(),
            content: "original content".to_string(),
            user_id,
            image: Some("https://example.com/old.png".to_string()),
            created_at: Utc::now(),
        }
    }

    fn fields(value: serde_json::Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn missing_post_is_not_found() {
        assert!(matches!(
            authorize_mutation(None, 1),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn non_owner_is_forbidden() {
        assert!(matches!(
            authorize_mutation(Some(post_owned_by(1)), 2),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn owner_is_authorized() {
        let post = authorize_mutation(Some(post_owned_by(1)), 1).unwrap();
        assert_eq!(post.user_id, 1);
    }

    #[test]
    fn title_only_update_leaves_other_fields() {
        let mut post = post_owned_by(1);
        apply_partial_update(&mut post, &fields(json!({"title": "x"})), None).unwrap();

        assert_eq!(post.title, "x");
        assert_eq!(post.content, "original content");
        assert_eq!(post.image.as_deref(), Some("https://example.com/old.png"));
    }

    #[test]
    fn new_image_applies_without_any_field() {
        let mut post = post_owned_by(1);
        apply_partial_update(&mut post, &Map::new(), Some("new-ref".to_string())).unwrap();

        assert_eq!(post.image.as_deref(), Some("new-ref"));
        assert_eq!(post.title, "original title");
    }

    #[test]
    fn unknown_and_protected_fields_are_ignored() {
        let mut post = post_owned_by(1);
        let before = post.clone();
        apply_partial_update(
            &mut post,
            &fields(json!({"id": 99, "user_id": 2, "image": "sneaky", "colour": "red"})),
            None,
        )
        .unwrap();

        assert_eq!(post, before);
    }

    #[test]
    fn non_string_value_fails_without_partial_changes() {
        let mut post = post_owned_by(1);
        let before = post.clone();
        let result = apply_partial_update(
            &mut post,
            &fields(json!({"content": "changed", "title": 5})),
            Some("img".to_string()),
        );

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(post, before);
    }
}
