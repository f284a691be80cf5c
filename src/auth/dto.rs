use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::dto::PublicUser;

/// Request body for login. Remember-me is opt-in per login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Request body for re-establishing a session from a persistent cookie.
#[derive(Debug, Deserialize)]
pub struct ResumeRequest {
    pub user_id: Uuid,
    pub remember_token: String,
}

/// Request body for account activation.
#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub email: String,
    pub token: String,
}

/// Request body for starting a password reset.
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

/// Request body for completing a password reset.
#[derive(Debug, Deserialize)]
pub struct ResetConfirmRequest {
    pub email: String,
    pub token: String,
    pub password: String,
}

/// Response returned after login, activation or resume. The remember token is
/// only present when the client asked for a persistent session; it is the one
/// plaintext copy that ever leaves the server.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remember_token: Option<String>,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remember_me_defaults_to_false() {
        let payload: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.c","password":"secret123"}"#).unwrap();
        assert!(!payload.remember_me);
    }

    #[test]
    fn remember_token_is_omitted_when_absent() {
        let response = AuthResponse {
            access_token: "jwt".into(),
            remember_token: None,
            user: PublicUser {
                id: Uuid::new_v4(),
                name: "Alice".into(),
                email: "alice@example.com".into(),
                activated: true,
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("remember_token"));
    }
}
