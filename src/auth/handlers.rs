use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            ActivateRequest, AuthResponse, LoginRequest, ResetConfirmRequest, ResetRequest,
            ResumeRequest, StatusMessage,
        },
        error::AuthError,
        jwt::{AuthUser, JwtKeys},
        password,
        service::AuthService,
    },
    state::AppState,
    users::{
        dto::PublicUser,
        repo_types::{CredentialKind, User},
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/activate", post(activate))
        .route("/auth/resume", post(resume))
        .route("/auth/logout", delete(logout))
        .route(
            "/auth/password-resets",
            post(request_password_reset).put(confirm_password_reset),
        )
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// One generic rejection per credential failure; which check failed is never
/// visible on the wire.
fn reject(err: AuthError) -> (StatusCode, String) {
    match err {
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            "Invalid email or password".into(),
        ),
        AuthError::InvalidToken | AuthError::Expired => (
            StatusCode::UNAUTHORIZED,
            "Invalid or expired token".into(),
        ),
        AuthError::EntropyUnavailable => {
            error!("token generation failed: entropy unavailable");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            )
        }
        AuthError::Internal(e) => {
            error!(error = %e, "auth internal error");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    let svc = AuthService::new(&state);
    let user = svc
        .login(&payload.email, &payload.password)
        .await
        .map_err(reject)?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys
        .sign(user.id)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let remember_token = if payload.remember_me {
        Some(svc.remember(&user).await.map_err(reject)?)
    } else {
        None
    };

    info!(user_id = %user.id, remembered = payload.remember_me, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        remember_token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn activate(
    State(state): State<AppState>,
    Json(mut payload): Json<ActivateRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let mut user = match user {
        Some(u) if u.authenticated(CredentialKind::Activation, &payload.token) => u,
        _ => {
            warn!(email = %payload.email, "activation failed");
            return Err(reject(AuthError::InvalidToken));
        }
    };

    let svc = AuthService::new(&state);
    svc.activate(&user).await.map_err(reject)?;
    user.activated = true;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys
        .sign(user.id)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(user_id = %user.id, "account activated");
    Ok(Json(AuthResponse {
        access_token,
        remember_token: None,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn resume(
    State(state): State<AppState>,
    Json(payload): Json<ResumeRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, payload.user_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let user = match user {
        Some(u) if u.authenticated(CredentialKind::Remember, &payload.remember_token) => u,
        _ => {
            warn!(user_id = %payload.user_id, "resume with invalid remember token");
            return Err(reject(AuthError::InvalidToken));
        }
    };

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys
        .sign(user.id)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(user_id = %user.id, "session resumed from remember token");
    Ok(Json(AuthResponse {
        access_token,
        remember_token: None,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<StatusMessage>, (StatusCode, String)> {
    AuthService::new(&state).forget(user_id).await.map_err(reject)?;
    info!(user_id = %user_id, "user logged out");
    Ok(Json(StatusMessage {
        message: "Logged out".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(mut payload): Json<ResetRequest>,
) -> Result<Json<StatusMessage>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    // The response never says whether the account exists.
    if let Some(user) = user {
        let svc = AuthService::new(&state);
        let token = svc.create_reset(&user).await.map_err(reject)?;
        if let Err(e) = state.mailer.send_password_reset_email(&user, &token).await {
            error!(error = %e, user_id = %user.id, "password reset email failed");
        }
        info!(user_id = %user.id, "password reset requested");
    } else {
        warn!(email = %payload.email, "password reset for unknown email");
    }

    Ok(Json(StatusMessage {
        message: "If that account exists, a password reset email has been sent.".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(mut payload): Json<ResetConfirmRequest>,
) -> Result<Json<StatusMessage>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.password.len() < 6 {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    let user = User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| reject(AuthError::InvalidToken))?;

    let svc = AuthService::new(&state);
    svc.validate_reset(&user, &payload.token).map_err(reject)?;

    let digest = password::hash_password(&payload.password, svc.hashing()).map_err(reject)?;
    User::reset_password(&state.db, user.id, &digest)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(user_id = %user.id, "password reset completed");
    Ok(Json(StatusMessage {
        message: "Password has been reset".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_pattern_accepts_ordinary_addresses() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
    }

    #[test]
    fn email_pattern_rejects_malformed_addresses() {
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("alice @example.com"));
    }
}
