use thiserror::Error;

/// Failures surfaced by the credential core.
///
/// Login failures are deliberately non-specific: an unknown email and a wrong
/// password both map to `InvalidCredentials`, so callers cannot enumerate
/// accounts.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Presented token does not match the stored digest.
    #[error("invalid token")]
    InvalidToken,

    /// Password-reset window elapsed.
    #[error("password reset expired")]
    Expired,

    /// System randomness is unavailable. Fatal: the process must not issue
    /// tokens at all rather than issue weak ones.
    #[error("system entropy unavailable")]
    EntropyUnavailable,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
