use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{handlers::is_valid_email, jwt::AuthUser, password, service::AuthService},
    microposts::repo_types::Micropost,
    relationships::repo::Relationship,
    state::AppState,
    users::{
        dto::{ProfileResponse, PublicUser, SignupRequest, SignupResponse},
        repo_types::User,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(signup))
        .route("/users/:id", get(show))
        .route("/me", get(me))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<Json<SignupResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();
    let name = payload.name.trim();

    if name.is_empty() || name.chars().count() > 50 {
        warn!("invalid name");
        return Err((StatusCode::BAD_REQUEST, "Invalid name".into()));
    }
    if payload.email.len() > 255 || !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    if payload.password.len() < 6 {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    // Ensure email is not taken
    if let Ok(Some(_)) = User::find_by_email(&state.db, &payload.email).await {
        warn!(email = %payload.email, "email already registered");
        return Err((StatusCode::CONFLICT, "Email already registered".into()));
    }

    let svc = AuthService::new(&state);
    let password_digest = password::hash_password(&payload.password, svc.hashing())
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let (activation_token, activation_digest) = svc
        .new_activation()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let user = User::create(
        &state.db,
        name,
        &payload.email,
        &password_digest,
        &activation_digest,
    )
    .await
    .map_err(|e| {
        error!(error = %e, "create user failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    if let Err(e) = state
        .mailer
        .send_activation_email(&user, &activation_token)
        .await
    {
        error!(error = %e, user_id = %user.id, "activation email failed");
    }

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok(Json(SignupResponse {
        user: PublicUser::from(&user),
        message: "Please check your email to activate your account.".into(),
    }))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    let microposts = Micropost::count_by_user(&state.db, id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let (following, followers) = Relationship::counts(&state.db, id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(ProfileResponse {
        id: user.id,
        name: user.name,
        microposts,
        following,
        followers,
    }))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    Ok(Json(PublicUser::from(&user)))
}
