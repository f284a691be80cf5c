use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::User;

const USER_COLUMNS: &str = "id, name, email, password_digest, remember_digest, \
     activation_digest, activated, activated_at, reset_digest, reset_sent_at, created_at";

impl User {
    /// Find a user by (lowercased) email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user. The activation digest is persisted with the record;
    /// its plaintext token only ever leaves through the activation email.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_digest: &str,
        activation_digest: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_digest, activation_digest)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(email)
        .bind(password_digest)
        .bind(activation_digest)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Replace or clear the remember digest. `None` forgets the user.
    pub async fn update_remember_digest(
        db: &PgPool,
        id: Uuid,
        digest: Option<&str>,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET remember_digest = $2 WHERE id = $1")
            .bind(id)
            .bind(digest)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Mark the account activated. Idempotent.
    pub async fn set_activated(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET activated = TRUE, activated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(OffsetDateTime::now_utc())
            .execute(db)
            .await?;
        Ok(())
    }

    /// Record a new in-flight password reset, superseding any prior request.
    pub async fn set_reset_digest(
        db: &PgPool,
        id: Uuid,
        digest: &str,
        sent_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET reset_digest = $2, reset_sent_at = $3 WHERE id = $1")
            .bind(id)
            .bind(digest)
            .bind(sent_at)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Store the new password digest and consume the reset request in one
    /// statement, so a used reset token can never validate again.
    pub async fn reset_password(
        db: &PgPool,
        id: Uuid,
        password_digest: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_digest = $2, reset_digest = NULL, reset_sent_at = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_digest)
        .execute(db)
        .await?;
        Ok(())
    }
}
