use crate::db::error::RepositoryError;
use crate::db::models::user::{NewUser, User};
use crate::db::schema::users;
use diesel::prelude::*;

diesel::define_sql_function!(fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text);

pub struct UserRepository;

impl UserRepository {
    /// Case-insensitive lookup, backed by the unique index on `lower(email)`.
    pub fn find_by_email(
        conn: &mut PgConnection,
        email: &str,
    ) -> Result<Option<User>, RepositoryError> {
        users::table
            .filter(lower(users::email).eq(email.to_lowercase()))
            .select(User::as_select())
            .first(conn)
            .optional()
            .map_err(Into::into)
    }

    pub fn find_by_id(conn: &mut PgConnection, id: i32) -> Result<Option<User>, RepositoryError> {
        users::table
            .find(id)
            .select(User::as_select())
            .first(conn)
            .optional()
            .map_err(Into::into)
    }

    pub fn create(conn: &mut PgConnection, new_user: &NewUser) -> Result<User, RepositoryError> {
        diesel::insert_into(users::table)
            .values(new_user)
            .returning(User::as_returning())
            .get_result(conn)
            .map_err(Into::into)
    }
}
