//! Random token generation and digesting.
//!
//! Tokens are handed to clients (cookie value, email link) in plaintext and
//! only their digest is ever persisted. Digesting goes through the same
//! Argon2 scheme as passwords, so comparing a presented token against a
//! stored digest is a verification, never a recompute-and-equal check.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};

use crate::auth::{
    error::AuthError,
    password::{self, Hashing},
};

/// 256 bits of randomness per token.
const TOKEN_BYTES: usize = 32;

/// Generate a new URL-safe random token.
pub fn new_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|_| AuthError::EntropyUnavailable)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// One-way, salted digest of a token, suitable for storage.
pub fn digest(token: &str, hashing: Hashing) -> Result<String, AuthError> {
    password::hash_password(token, hashing)
}

/// Startup check: fail before serving rather than issue weak tokens later.
pub fn probe_entropy() -> Result<(), AuthError> {
    new_token().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique() {
        let a = new_token().expect("token generation");
        let b = new_token().expect("token generation");
        assert_ne!(a, b);
    }

    #[test]
    fn tokens_are_unpadded_base64url() {
        let token = new_token().expect("token generation");
        // 32 bytes encode to 43 chars without padding
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert!(!token.contains('='));
    }

    #[test]
    fn digest_verifies_against_its_token() {
        let token = new_token().expect("token generation");
        let digest = digest(&token, Hashing::fast()).expect("digesting");
        assert!(password::verify_password(&token, &digest));
        assert!(!password::verify_password("some-other-token", &digest));
    }

    #[test]
    fn probe_succeeds() {
        assert!(probe_entropy().is_ok());
    }
}
