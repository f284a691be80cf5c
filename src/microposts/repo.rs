use sqlx::PgPool;
use uuid::Uuid;

use crate::microposts::repo_types::Micropost;

impl Micropost {
    pub async fn create(db: &PgPool, user_id: Uuid, content: &str) -> anyhow::Result<Micropost> {
        let post = sqlx::query_as::<_, Micropost>(
            r#"
            INSERT INTO microposts (user_id, content)
            VALUES ($1, $2)
            RETURNING id, user_id, content, created_at
            "#,
        )
        .bind(user_id)
        .bind(content)
        .fetch_one(db)
        .await?;
        Ok(post)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Micropost>> {
        let post = sqlx::query_as::<_, Micropost>(
            "SELECT id, user_id, content, created_at FROM microposts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(post)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM microposts WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Posts by the user and everyone they follow, newest first.
    pub async fn feed(db: &PgPool, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<Micropost>> {
        let posts = sqlx::query_as::<_, Micropost>(
            r#"
            SELECT id, user_id, content, created_at
            FROM microposts
            WHERE user_id = $1
               OR user_id IN (SELECT followed_id FROM relationships WHERE follower_id = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(db)
        .await?;
        Ok(posts)
    }

    pub async fn count_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM microposts WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(db)
                .await?;
        Ok(count)
    }
}
