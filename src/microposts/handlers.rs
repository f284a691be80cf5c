use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    microposts::{
        dto::{CreateMicropostRequest, FeedResponse},
        repo_types::Micropost,
    },
    state::AppState,
};

const FEED_LIMIT: i64 = 50;

pub fn micropost_routes() -> Router<AppState> {
    Router::new()
        .route("/microposts", post(create))
        .route("/microposts/:id", delete(remove))
        .route("/feed", get(feed))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateMicropostRequest>,
) -> Result<Json<Micropost>, (StatusCode, String)> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Content can't be blank".into()));
    }
    if content.chars().count() > 140 {
        warn!(user_id = %user_id, "micropost too long");
        return Err((
            StatusCode::BAD_REQUEST,
            "Content is too long (maximum is 140 characters)".into(),
        ));
    }

    let post = Micropost::create(&state.db, user_id, content)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(user_id = %user_id, micropost_id = %post.id, "micropost created");
    Ok(Json(post))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let post = Micropost::find_by_id(&state.db, id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::NOT_FOUND, "Micropost not found".to_string()))?;

    if post.user_id != user_id {
        warn!(user_id = %user_id, micropost_id = %id, "delete of another user's micropost");
        return Err((StatusCode::FORBIDDEN, "Not your micropost".into()));
    }

    Micropost::delete(&state.db, id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(user_id = %user_id, micropost_id = %id, "micropost deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn feed(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<FeedResponse>, (StatusCode, String)> {
    let microposts = Micropost::feed(&state.db, user_id, FEED_LIMIT)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(FeedResponse { microposts }))
}
