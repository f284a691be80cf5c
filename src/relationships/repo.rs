use sqlx::PgPool;
use uuid::Uuid;

use crate::users::repo_types::User;

pub struct Relationship;

impl Relationship {
    /// Record a follow edge. Idempotent: re-following is a no-op.
    pub async fn follow(db: &PgPool, follower_id: Uuid, followed_id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO relationships (follower_id, followed_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Remove a follow edge. Idempotent.
    pub async fn unfollow(db: &PgPool, follower_id: Uuid, followed_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM relationships WHERE follower_id = $1 AND followed_id = $2")
            .bind(follower_id)
            .bind(followed_id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn following(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.email, u.password_digest, u.remember_digest,
                   u.activation_digest, u.activated, u.activated_at, u.reset_digest,
                   u.reset_sent_at, u.created_at
            FROM users u
            JOIN relationships r ON r.followed_id = u.id
            WHERE r.follower_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    pub async fn followers(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.email, u.password_digest, u.remember_digest,
                   u.activation_digest, u.activated, u.activated_at, u.reset_digest,
                   u.reset_sent_at, u.created_at
            FROM users u
            JOIN relationships r ON r.follower_id = u.id
            WHERE r.followed_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// (following, followers) counts for a profile.
    pub async fn counts(db: &PgPool, user_id: Uuid) -> anyhow::Result<(i64, i64)> {
        let following =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM relationships WHERE follower_id = $1")
                .bind(user_id)
                .fetch_one(db)
                .await?;
        let followers =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM relationships WHERE followed_id = $1")
                .bind(user_id)
                .fetch_one(db)
                .await?;
        Ok((following, followers))
    }
}
