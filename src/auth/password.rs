//! Password hashing and verification.

use anyhow::anyhow;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::auth::error::AuthError;
use crate::config::HashingConfig;

/// Argon2 cost parameters used when creating digests. Verification always
/// reads the parameters embedded in the digest itself.
#[derive(Debug, Clone, Copy)]
pub struct Hashing {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Hashing {
    /// Cheapest legal cost, for tests only.
    pub fn fast() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn to_argon2(self) -> Result<Argon2<'static>, AuthError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| AuthError::Internal(anyhow!("argon2 params: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Hashing {
    /// Argon2id RFC 9106 low-memory recommendation.
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl From<HashingConfig> for Hashing {
    fn from(config: HashingConfig) -> Self {
        Self {
            memory_kib: config.memory_kib,
            iterations: config.iterations,
            parallelism: config.parallelism,
        }
    }
}

pub fn hash_password(plain: &str, hashing: Hashing) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hashing
        .to_argon2()?
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            AuthError::Internal(anyhow!(e.to_string()))
        })?
        .to_string();
    Ok(hash)
}

/// Whether `plain` matches `digest`. An absent, empty, or malformed digest
/// never verifies: an account without a digest cannot authenticate.
pub fn verify_password(plain: &str, digest: &str) -> bool {
    let parsed = match PasswordHash::new(digest) {
        Ok(p) => p,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password, Hashing::fast()).expect("hashing should succeed");
        assert!(verify_password(password, &hash));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password, Hashing::fast()).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn same_password_hashes_differently() {
        let password = "same_password";
        let first = hash_password(password, Hashing::fast()).expect("hashing should succeed");
        let second = hash_password(password, Hashing::fast()).expect("hashing should succeed");
        // Fresh salt per call
        assert_ne!(first, second);
        assert!(verify_password(password, &first));
        assert!(verify_password(password, &second));
    }

    #[test]
    fn verify_rejects_empty_and_malformed_digests() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "not-a-valid-hash"));
    }
}
