use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::auth::password;

/// What a stored digest protects. Each purpose maps to exactly one column on
/// the user record; the plaintext counterpart is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Password,
    Remember,
    Activation,
    Reset,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String, // stored lowercase
    #[serde(skip_serializing)]
    pub password_digest: String,
    #[serde(skip_serializing)]
    pub remember_digest: Option<String>, // absent unless a persistent session is active
    #[serde(skip_serializing)]
    pub activation_digest: Option<String>,
    pub activated: bool,
    pub activated_at: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub reset_digest: Option<String>,
    pub reset_sent_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl User {
    /// The stored digest for a credential purpose, if any.
    pub fn digest_for(&self, kind: CredentialKind) -> Option<&str> {
        match kind {
            CredentialKind::Password => Some(self.password_digest.as_str()),
            CredentialKind::Remember => self.remember_digest.as_deref(),
            CredentialKind::Activation => self.activation_digest.as_deref(),
            CredentialKind::Reset => self.reset_digest.as_deref(),
        }
    }

    /// Whether `token` matches the stored digest for `kind`. False when no
    /// digest is stored.
    pub fn authenticated(&self, kind: CredentialKind, token: &str) -> bool {
        match self.digest_for(kind) {
            Some(digest) => password::verify_password(token, digest),
            None => false,
        }
    }

    /// Whether the in-flight password reset is older than `window`. True when
    /// no reset was ever requested.
    pub fn password_reset_expired(&self, window: Duration) -> bool {
        match self.reset_sent_at {
            Some(sent_at) => OffsetDateTime::now_utc() - sent_at > window,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::{hash_password, Hashing};

    fn user_with_digests(
        remember: Option<String>,
        activation: Option<String>,
        reset: Option<String>,
        reset_sent_at: Option<OffsetDateTime>,
    ) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_digest: hash_password("secret123", Hashing::fast()).unwrap(),
            remember_digest: remember,
            activation_digest: activation,
            activated: false,
            activated_at: None,
            reset_digest: reset,
            reset_sent_at,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn digest_for_maps_each_kind_to_its_column() {
        let user = user_with_digests(
            Some("r".into()),
            Some("a".into()),
            Some("p".into()),
            None,
        );
        assert_eq!(user.digest_for(CredentialKind::Remember), Some("r"));
        assert_eq!(user.digest_for(CredentialKind::Activation), Some("a"));
        assert_eq!(user.digest_for(CredentialKind::Reset), Some("p"));
        assert!(user.digest_for(CredentialKind::Password).is_some());
    }

    #[test]
    fn authenticated_is_false_without_a_digest() {
        let user = user_with_digests(None, None, None, None);
        assert!(!user.authenticated(CredentialKind::Remember, "whatever"));
        assert!(!user.authenticated(CredentialKind::Reset, "whatever"));
    }

    #[test]
    fn authenticated_verifies_the_matching_token() {
        let token = "not-very-random-test-token";
        let digest = hash_password(token, Hashing::fast()).unwrap();
        let user = user_with_digests(Some(digest), None, None, None);
        assert!(user.authenticated(CredentialKind::Remember, token));
        assert!(!user.authenticated(CredentialKind::Remember, "a-different-token"));
    }

    #[test]
    fn reset_expiry_window() {
        let window = Duration::hours(2);

        let fresh = user_with_digests(None, None, None, Some(OffsetDateTime::now_utc()));
        assert!(!fresh.password_reset_expired(window));

        let stale = user_with_digests(
            None,
            None,
            None,
            Some(OffsetDateTime::now_utc() - Duration::hours(3)),
        );
        assert!(stale.password_reset_expired(window));

        let never_requested = user_with_digests(None, None, None, None);
        assert!(never_requested.password_reset_expired(window));
    }
}
