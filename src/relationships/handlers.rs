use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    relationships::repo::Relationship,
    state::AppState,
    users::{dto::PublicUser, repo_types::User},
};

pub fn relationship_routes() -> Router<AppState> {
    Router::new()
        .route("/users/:id/follow", axum::routing::post(follow).delete(unfollow))
        .route("/users/:id/following", get(following))
        .route("/users/:id/followers", get(followers))
}

#[instrument(skip(state))]
pub async fn follow(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if id == user_id {
        warn!(user_id = %user_id, "attempt to follow self");
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "Cannot follow yourself".into(),
        ));
    }

    User::find_by_id(&state.db, id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    Relationship::follow(&state.db, user_id, id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(follower_id = %user_id, followed_id = %id, "followed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn unfollow(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    Relationship::unfollow(&state.db, user_id, id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(follower_id = %user_id, followed_id = %id, "unfollowed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn following(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PublicUser>>, (StatusCode, String)> {
    let users = Relationship::following(&state.db, id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(users.iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn followers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PublicUser>>, (StatusCode, String)> {
    let users = Relationship::followers(&state.db, id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(users.iter().map(PublicUser::from).collect()))
}
