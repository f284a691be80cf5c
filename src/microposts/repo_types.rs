use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Micropost record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Micropost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String, // at most 140 characters
    pub created_at: OffsetDateTime,
}
