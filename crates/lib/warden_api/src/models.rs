//! Request and response bodies.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::models::credential::Credential;

/// Error body returned for every failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable code.
    pub code: String,
    pub message: String,
}

/// `POST /auth/login` body. `username`/`password` are accepted as aliases.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub identifier: String,
    #[serde(alias = "password")]
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Session lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub new_password: Option<String>,
    pub old_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// `?service=retry` re-sends a pending reset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForgotPasswordQuery {
    pub service: Option<String>,
}

impl ForgotPasswordQuery {
    pub fn retry_requested(&self) -> bool {
        self.service.as_deref() == Some("retry")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetTokenQuery {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

/// `{id, message}` acknowledgement for mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub message: String,
}

impl MessageResponse {
    pub fn new(id: Uuid, message: &str) -> Self {
        Self {
            id,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub must_change_password: bool,
}

impl From<Credential> for ProfileResponse {
    fn from(c: Credential) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            must_change_password: c.must_change_password,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<Credential> for UserSummary {
    fn from(c: Credential) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_accepts_username_password_aliases() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"username":"a@x.com","password":"pw"}"#).unwrap();
        assert_eq!(req.identifier, "a@x.com");
        assert_eq!(req.secret, "pw");
    }

    #[test]
    fn update_request_uses_camel_case() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"newPassword":"n","oldPassword":"o"}"#).unwrap();
        assert_eq!(req.new_password.as_deref(), Some("n"));
        assert_eq!(req.old_password.as_deref(), Some("o"));
        assert!(req.name.is_none());
    }

    #[test]
    fn only_retry_service_requests_retry() {
        assert!(ForgotPasswordQuery { service: Some("retry".into()) }.retry_requested());
        assert!(!ForgotPasswordQuery { service: Some("other".into()) }.retry_requested());
        assert!(!ForgotPasswordQuery::default().retry_requested());
    }
}
