use anyhow::Context;
use sqlx::SqliteConnection;

use crate::auth::repo_types::User;

impl User {
    /// Find any user holding either the username or the email.
    pub async fn find_by_username_or_email(
        conn: &mut SqliteConnection,
        username: &str,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, hashed_password
            FROM users
            WHERE username = ?1 OR email = ?2
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_optional(conn)
        .await
        .context("find user by username or email")?;
        Ok(user)
    }

    pub async fn find_by_username(
        conn: &mut SqliteConnection,
        username: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, hashed_password
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(conn)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    /// Insert a new user. The raw `sqlx::Error` is kept so callers can detect
    /// unique violations.
    pub async fn create(
        conn: &mut SqliteConnection,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, hashed_password)
            VALUES (?1, ?2, ?3)
            RETURNING id, username, email, hashed_password
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(conn)
        .await
    }
}
