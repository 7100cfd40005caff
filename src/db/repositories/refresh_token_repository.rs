use crate::db::error::RepositoryError;
use crate::db::models::refresh_token::{NewRefreshToken, RefreshToken};
use crate::db::schema::refresh_tokens;
use chrono::Utc;
use diesel::prelude::*;

pub struct RefreshTokenRepository;

impl RefreshTokenRepository {
    pub fn find_by_user(
        conn: &mut PgConnection,
        user_id: i32,
    ) -> Result<Option<RefreshToken>, RepositoryError> {
        refresh_tokens::table
            .filter(refresh_tokens::user_id.eq(user_id))
            .select(RefreshToken::as_select())
            .first(conn)
            .optional()
            .map_err(Into::into)
    }

    /// Same as `find_by_user` but locks the row until the surrounding
    /// transaction ends.
    pub fn find_by_user_for_update(
        conn: &mut PgConnection,
        user_id: i32,
    ) -> Result<Option<RefreshToken>, RepositoryError> {
        refresh_tokens::table
            .filter(refresh_tokens::user_id.eq(user_id))
            .select(RefreshToken::as_select())
            .for_update()
            .first(conn)
            .optional()
            .map_err(Into::into)
    }

    /// Inserts the token unless the user already has one, then returns the
    /// row that is stored either way.
    pub fn insert_if_absent(
        conn: &mut PgConnection,
        new_token: &NewRefreshToken<'_>,
    ) -> Result<RefreshToken, RepositoryError> {
        diesel::insert_into(refresh_tokens::table)
            .values(new_token)
            .on_conflict(refresh_tokens::user_id)
            .do_nothing()
            .execute(conn)?;

        refresh_tokens::table
            .filter(refresh_tokens::user_id.eq(new_token.user_id))
            .select(RefreshToken::as_select())
            .first(conn)
            .map_err(Into::into)
    }

    pub fn replace_token(
        conn: &mut PgConnection,
        user_id: i32,
        token: &str,
    ) -> Result<RefreshToken, RepositoryError> {
        diesel::update(refresh_tokens::table.filter(refresh_tokens::user_id.eq(user_id)))
            .set((
                refresh_tokens::refresh_token.eq(token),
                refresh_tokens::updated_at.eq(Utc::now()),
            ))
            .returning(RefreshToken::as_returning())
            .get_result(conn)
            .map_err(Into::into)
    }

    /// Returns the number of rows removed (0 or 1).
    pub fn delete_by_user(conn: &mut PgConnection, user_id: i32) -> Result<usize, RepositoryError> {
        diesel::delete(refresh_tokens::table.filter(refresh_tokens::user_id.eq(user_id)))
            .execute(conn)
            .map_err(Into::into)
    }
}
