use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, User},
    traits::StorefrontApiError,
};

/// Inserts the user, or returns the existing record when the email address is already
/// registered. SQLite upserts make this a single statement.
pub async fn upsert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, StorefrontApiError> {
    let user = sqlx::query_as(
        r#"
            INSERT INTO users (email, display_name) VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE SET display_name = excluded.display_name
            RETURNING *;
        "#,
    )
    .bind(user.email)
    .bind(user.display_name)
    .fetch_one(conn)
    .await?;
    Ok(user)
}

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(conn).await?;
    Ok(user)
}
