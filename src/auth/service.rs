//! The credential core: login, persistent-session tokens, account activation
//! and password-reset lifecycles.
//!
//! Stateless compute over user records supplied per call; the database is the
//! sole arbiter of write ordering when the same user is touched concurrently.

use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::{error::AuthError, password, password::Hashing, token},
    state::AppState,
    users::repo_types::{CredentialKind, User},
};

pub struct AuthService<'a> {
    db: &'a PgPool,
    hashing: Hashing,
    reset_window: Duration,
}

impl<'a> AuthService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: &state.db,
            hashing: state.config.hashing.into(),
            reset_window: Duration::minutes(state.config.reset_ttl_minutes),
        }
    }

    pub fn hashing(&self) -> Hashing {
        self.hashing
    }

    /// Verify an email/password pair. Unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email);
        let candidate = User::find_by_email(self.db, &email).await?;
        check_credentials(candidate, password)
    }

    /// Issue a remember token for a persistent session. The digest replaces
    /// any prior one, so previously issued tokens stop validating.
    pub async fn remember(&self, user: &User) -> Result<String, AuthError> {
        let token = token::new_token()?;
        let digest = token::digest(&token, self.hashing)?;
        User::update_remember_digest(self.db, user.id, Some(&digest)).await?;
        Ok(token)
    }

    /// Drop the persistent session. Idempotent.
    pub async fn forget(&self, user_id: Uuid) -> Result<(), AuthError> {
        User::update_remember_digest(self.db, user_id, None).await?;
        Ok(())
    }

    /// Token/digest pair for a new account. Called before first persistence;
    /// the digest goes into the insert, the token into the activation email.
    pub fn new_activation(&self) -> Result<(String, String), AuthError> {
        let token = token::new_token()?;
        let digest = token::digest(&token, self.hashing)?;
        Ok((token, digest))
    }

    /// Mark the account's email as confirmed. Idempotent.
    pub async fn activate(&self, user: &User) -> Result<(), AuthError> {
        User::set_activated(self.db, user.id).await?;
        Ok(())
    }

    /// Start (or restart) a password reset, superseding any pending request.
    pub async fn create_reset(&self, user: &User) -> Result<String, AuthError> {
        let token = token::new_token()?;
        let digest = token::digest(&token, self.hashing)?;
        User::set_reset_digest(self.db, user.id, &digest, OffsetDateTime::now_utc()).await?;
        Ok(token)
    }

    /// Check a presented reset token against the pending request. Consuming
    /// the request (clearing the digest after a successful password change)
    /// is the caller's job, inside the password-update statement.
    pub fn validate_reset(&self, user: &User, token: &str) -> Result<(), AuthError> {
        if user.reset_sent_at.is_none() {
            return Err(AuthError::InvalidToken);
        }
        if user.password_reset_expired(self.reset_window) {
            return Err(AuthError::Expired);
        }
        if !user.authenticated(CredentialKind::Reset, token) {
            return Err(AuthError::InvalidToken);
        }
        Ok(())
    }
}

/// Lowercase-normalized form of an email, as stored.
pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// The login decision itself. A missing record and a digest mismatch produce
/// the same error kind.
fn check_credentials(candidate: Option<User>, password: &str) -> Result<User, AuthError> {
    let user = match candidate {
        Some(u) => u,
        None => {
            warn!("login unknown email");
            return Err(AuthError::InvalidCredentials);
        }
    };
    if !password::verify_password(password, &user.password_digest) {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;

    fn service(state: &AppState) -> AuthService<'_> {
        AuthService::new(state)
    }

    fn user_with_reset(digest: Option<String>, sent_at: Option<OffsetDateTime>) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_digest: hash_password("secret123", Hashing::fast()).unwrap(),
            remember_digest: None,
            activation_digest: None,
            activated: true,
            activated_at: Some(OffsetDateTime::now_utc()),
            reset_digest: digest,
            reset_sent_at: sent_at,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn emails_normalize_to_lowercase() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert_eq!(normalize_email("ALICE@example.com"), "alice@example.com");
    }

    #[test]
    fn correct_credentials_pass_the_login_check() {
        let user = user_with_reset(None, None);
        let result = check_credentials(Some(user.clone()), "secret123");
        assert_eq!(result.unwrap().id, user.id);
    }

    #[test]
    fn unknown_email_and_wrong_password_fail_alike() {
        let user = user_with_reset(None, None);
        let wrong_password = check_credentials(Some(user), "wrong");
        let unknown_email = check_credentials(None, "secret123");
        assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown_email, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn validate_reset_accepts_a_fresh_matching_token() {
        let state = AppState::fake();
        let svc = service(&state);
        let token = token::new_token().unwrap();
        let digest = token::digest(&token, Hashing::fast()).unwrap();
        let user = user_with_reset(Some(digest), Some(OffsetDateTime::now_utc()));
        assert!(svc.validate_reset(&user, &token).is_ok());
    }

    #[tokio::test]
    async fn validate_reset_rejects_an_elapsed_window() {
        let state = AppState::fake();
        let svc = service(&state);
        let token = token::new_token().unwrap();
        let digest = token::digest(&token, Hashing::fast()).unwrap();
        let user = user_with_reset(
            Some(digest),
            Some(OffsetDateTime::now_utc() - Duration::hours(3)),
        );
        assert!(matches!(
            svc.validate_reset(&user, &token),
            Err(AuthError::Expired)
        ));
    }

    #[tokio::test]
    async fn validate_reset_rejects_a_wrong_token() {
        let state = AppState::fake();
        let svc = service(&state);
        let token = token::new_token().unwrap();
        let digest = token::digest(&token, Hashing::fast()).unwrap();
        let user = user_with_reset(Some(digest), Some(OffsetDateTime::now_utc()));
        assert!(matches!(
            svc.validate_reset(&user, "not-the-issued-token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn validate_reset_rejects_when_no_request_is_pending() {
        let state = AppState::fake();
        let svc = service(&state);
        let user = user_with_reset(None, None);
        assert!(matches!(
            svc.validate_reset(&user, "anything"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn a_superseded_remember_token_stops_validating() {
        // Issuance replaces the digest wholesale; simulate two issuances
        // against the same record.
        let first = token::new_token().unwrap();
        let second = token::new_token().unwrap();
        let mut user = user_with_reset(None, None);
        user.remember_digest = Some(token::digest(&first, Hashing::fast()).unwrap());
        assert!(user.authenticated(CredentialKind::Remember, &first));

        user.remember_digest = Some(token::digest(&second, Hashing::fast()).unwrap());
        assert!(!user.authenticated(CredentialKind::Remember, &first));
        assert!(user.authenticated(CredentialKind::Remember, &second));
    }

    #[test]
    fn a_forgotten_user_has_no_valid_remember_token() {
        let token = token::new_token().unwrap();
        let mut user = user_with_reset(None, None);
        user.remember_digest = Some(token::digest(&token, Hashing::fast()).unwrap());
        assert!(user.authenticated(CredentialKind::Remember, &token));

        user.remember_digest = None;
        assert!(!user.authenticated(CredentialKind::Remember, &token));
    }
}
