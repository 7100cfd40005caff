use crate::db::error::RepositoryError;
use crate::db::models::post::{NewPost, Post, PostChangeset};
use crate::db::models::user::User;
use crate::db::schema::{posts, users};
use diesel::pg::Pg;
use diesel::prelude::*;

pub struct PostRepository;

impl PostRepository {
    pub fn create(conn: &mut PgConnection, new_post: &NewPost) -> Result<Post, RepositoryError> {
        diesel::insert_into(posts::table)
            .values(new_post)
            .returning(Post::as_returning())
            .get_result(conn)
            .map_err(Into::into)
    }

    pub fn find_by_id(conn: &mut PgConnection, id: i32) -> Result<Option<Post>, RepositoryError> {
        posts::table
            .find(id)
            .select(Post::as_select())
            .first(conn)
            .optional()
            .map_err(Into::into)
    }

    /// Locks the post row for the rest of the transaction.
    pub fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: i32,
    ) -> Result<Option<Post>, RepositoryError> {
        posts::table
            .find(id)
            .select(Post::as_select())
            .for_update()
            .first(conn)
            .optional()
            .map_err(Into::into)
    }

    /// Post together with its author, fetched with an explicit join.
    pub fn find_with_author(
        conn: &mut PgConnection,
        id: i32,
    ) -> Result<Option<(Post, User)>, RepositoryError> {
        posts::table
            .inner_join(users::table)
            .filter(posts::id.eq(id))
            .select((Post::as_select(), User::as_select()))
            .first(conn)
            .optional()
            .map_err(Into::into)
    }

    /// All posts of one user, newest first.
    pub fn list_by_user(conn: &mut PgConnection, user_id: i32) -> Result<Vec<Post>, RepositoryError> {
        posts::table
            .filter(posts::user_id.eq(user_id))
            .order(posts::id.desc())
            .select(Post::as_select())
            .load(conn)
            .map_err(Into::into)
    }

    pub fn update(conn: &mut PgConnection, post: &Post) -> Result<Post, RepositoryError> {
        diesel::update(posts::table.find(post.id))
            .set(PostChangeset::from(post))
            .returning(Post::as_returning())
            .get_result(conn)
            .map_err(Into::into)
    }

    pub fn delete(conn: &mut PgConnection, id: i32) -> Result<usize, RepositoryError> {
        diesel::delete(posts::table.find(id))
            .execute(conn)
            .map_err(Into::into)
    }

    pub fn count_matching(
        conn: &mut PgConnection,
        search: Option<&str>,
    ) -> Result<i64, RepositoryError> {
        Self::matching(search)
            .count()
            .get_result(conn)
            .map_err(Into::into)
    }

    /// One page of posts matching `search`, ordered by id descending.
    pub fn list_page(
        conn: &mut PgConnection,
        search: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>, RepositoryError> {
        Self::matching(search)
            .order(posts::id.desc())
            .offset(offset)
            .limit(limit)
            .select(Post::as_select())
            .load(conn)
            .map_err(Into::into)
    }

    fn matching(search: Option<&str>) -> posts::BoxedQuery<'static, Pg> {
        let mut query = posts::table.into_boxed();
        if let Some(term) = search.filter(|t| !t.is_empty()) {
            query = query.filter(posts::title.ilike(format!("%{}%", escape_like(term))));
        }
        query
    }
}

/// Escapes LIKE wildcards so the term matches literally. Postgres uses
/// backslash as the default escape character.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
