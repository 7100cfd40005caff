use crate::db::schema::posts;
use chrono::{DateTime, Utc};
use diesel::{AsChangeset, Insertable, Queryable, Selectable};

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub user_id: i32,
    pub image: Option<String>,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub user_id: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The mutable columns of a post, written back in one UPDATE.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = posts)]
#[diesel(treat_none_as_null = true)]
pub struct PostChangeset<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub image: Option<&'a str>,
}

impl<'a> From<&'a Post> for PostChangeset<'a> {
    fn from(post: &'a Post) -> Self {
        Self {
            title: &post.title,
            content: &post.content,
            image: post.image.as_deref(),
        }
    }
}
