//! API server configuration.
//!
//! Built once at startup and shared read-only by every component.

use std::fmt;

use chrono::Duration;
use thiserror::Error;
use url::Url;
use warden_core::auth::jwt::TokenService;
use warden_core::lifecycle::NotificationSettings;

/// Longest accepted session lifetime: 30 days.
pub const MAX_SESSION_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Configuration errors detected by [`ApiConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("JWT_SECRET and JWT_SECRET_PASSWORD must differ")]
    SharedSecret,

    #[error("SESSION_TTL_SECS must be between 1 and {max}, got {0}", max = MAX_SESSION_TTL_SECS)]
    InvalidTtl(i64),
}

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3000").
    pub bind_addr: String,
    /// Path prefix all routes are mounted under (e.g. "/api/v1"); empty for none.
    pub api_prefix: String,
    /// Session token signing secret.
    pub jwt_secret: String,
    /// Session token lifetime in seconds.
    pub session_ttl_secs: i64,
    /// Reset token signing secret; must differ from `jwt_secret`.
    pub reset_secret: String,
    /// Shared secret guarding user provisioning.
    pub provisioning_secret: String,
    /// Front-end base URL used to build reset links.
    pub app_url: Url,
    /// Application name used in notifications.
    pub app_name: String,
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::Empty("JWT_SECRET"));
        }
        if self.reset_secret.is_empty() {
            return Err(ConfigError::Empty("JWT_SECRET_PASSWORD"));
        }
        if self.provisioning_secret.is_empty() {
            return Err(ConfigError::Empty("AUTH_BASE_TOKEN"));
        }
        if self.jwt_secret == self.reset_secret {
            return Err(ConfigError::SharedSecret);
        }
        if !(1..=MAX_SESSION_TTL_SECS).contains(&self.session_ttl_secs) {
            return Err(ConfigError::InvalidTtl(self.session_ttl_secs));
        }
        Ok(())
    }

    /// Prefix with a leading slash and no trailing slash, or empty.
    pub fn route_prefix(&self) -> String {
        let trimmed = self.api_prefix.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    /// Token service for the configured secrets. A TTL that [`validate`](Self::validate)
    /// would reject makes every session issuance fail with an internal error.
    pub fn token_service(&self) -> TokenService {
        let ttl = Duration::try_seconds(self.session_ttl_secs).unwrap_or(Duration::MAX);
        TokenService::new(&self.jwt_secret, ttl, &self.reset_secret)
    }

    pub fn notification_settings(&self) -> NotificationSettings {
        NotificationSettings {
            app_name: self.app_name.clone(),
            app_url: self.app_url.clone(),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("api_prefix", &self.api_prefix)
            .field("jwt_secret", &"<redacted>")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("reset_secret", &"<redacted>")
            .field("provisioning_secret", &"<redacted>")
            .field("app_url", &self.app_url.as_str())
            .field("app_name", &self.app_name)
            .finish()
    }
}
