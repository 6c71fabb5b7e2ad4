//! Signed token issuance and verification (HS256).
//!
//! Session tokens and reset tokens share the same primitive but are signed
//! with distinct secrets, so one can never be replayed as the other.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::models::credential::TokenClaims;

/// Reset token lifetime: 2 hours.
pub const RESET_TOKEN_EXPIRY_SECS: i64 = 2 * 60 * 60;

/// Claims as they travel on the wire: caller claims plus the validity window.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<C> {
    #[serde(flatten)]
    claims: C,
    iat: i64,
    exp: i64,
}

/// Sign `claims` with `secret`, valid for `ttl` from now.
pub fn issue<C: Serialize>(claims: &C, ttl: Duration, secret: &[u8]) -> Result<String, AuthError> {
    issue_at(claims, ttl, secret, Utc::now())
}

/// Sign `claims` with `secret`, valid for `ttl` from `issued_at`.
pub fn issue_at<C: Serialize>(
    claims: &C,
    ttl: Duration,
    secret: &[u8],
    issued_at: DateTime<Utc>,
) -> Result<String, AuthError> {
    if ttl <= Duration::zero() {
        return Err(AuthError::Internal(format!(
            "token ttl must be positive, got {}s",
            ttl.num_seconds()
        )));
    }
    let expires_at = issued_at.checked_add_signed(ttl).ok_or_else(|| {
        AuthError::Internal(format!(
            "token expiry out of range for ttl {}s",
            ttl.num_seconds()
        ))
    })?;
    let envelope = Envelope {
        claims,
        iat: issued_at.timestamp(),
        exp: expires_at.timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &envelope,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

/// Verify signature and expiry of `token` against `secret`, returning the claims.
pub fn verify<C: DeserializeOwned>(token: &str, secret: &[u8]) -> Result<C, AuthError> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    let data = decode::<Envelope<C>>(token, &key, &validation)
        .map_err(|e| AuthError::Authentication(format!("invalid token: {e}")))?;

    // The library accepts `exp == now`; treat the boundary itself as expired.
    if data.claims.exp <= Utc::now().timestamp() {
        return Err(AuthError::Authentication("invalid token: expired".into()));
    }
    Ok(data.claims.claims)
}

/// Issues and verifies the two token purposes with their own secret and TTL.
#[derive(Clone)]
pub struct TokenService {
    session_secret: Arc<[u8]>,
    session_ttl: Duration,
    reset_secret: Arc<[u8]>,
    reset_ttl: Duration,
}

impl TokenService {
    /// Build a service from the session secret/TTL and the reset secret.
    /// Reset tokens always use [`RESET_TOKEN_EXPIRY_SECS`].
    pub fn new(session_secret: &str, session_ttl: Duration, reset_secret: &str) -> Self {
        Self {
            session_secret: Arc::from(session_secret.as_bytes()),
            session_ttl,
            reset_secret: Arc::from(reset_secret.as_bytes()),
            reset_ttl: Duration::seconds(RESET_TOKEN_EXPIRY_SECS),
        }
    }

    /// Configured session token lifetime.
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Session token whose subject is the credential id.
    pub fn issue_session(&self, credential_id: &str) -> Result<String, AuthError> {
        issue(
            &TokenClaims::new(credential_id),
            self.session_ttl,
            &self.session_secret,
        )
    }

    pub fn verify_session(&self, token: &str) -> Result<TokenClaims, AuthError> {
        verify(token, &self.session_secret)
    }

    /// Reset token whose subject is the credential email.
    pub fn issue_reset(&self, email: &str) -> Result<String, AuthError> {
        issue(&TokenClaims::new(email), self.reset_ttl, &self.reset_secret)
    }

    pub fn verify_reset(&self, token: &str) -> Result<TokenClaims, AuthError> {
        verify(token, &self.reset_secret)
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("session_secret", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .field("reset_secret", &"<redacted>")
            .field("reset_ttl", &self.reset_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"session-secret";

    #[test]
    fn verify_returns_issued_claims() {
        let claims = TokenClaims::new("0190a3b2-user");
        let token = issue(&claims, Duration::seconds(60), SECRET).unwrap();
        let decoded: TokenClaims = verify(&token, SECRET).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token = issue(&TokenClaims::new("u1"), Duration::seconds(60), SECRET).unwrap();
        let err = verify::<TokenClaims>(&token, b"other-secret").unwrap_err();
        assert!(matches!(err, AuthError::Authentication(_)));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let issued_at = Utc::now() - Duration::seconds(120);
        let token =
            issue_at(&TokenClaims::new("u1"), Duration::seconds(60), SECRET, issued_at).unwrap();
        let err = verify::<TokenClaims>(&token, SECRET).unwrap_err();
        assert!(matches!(err, AuthError::Authentication(_)));
    }

    #[test]
    fn verify_rejects_token_at_expiry_boundary() {
        let issued_at = Utc::now() - Duration::seconds(60);
        let token =
            issue_at(&TokenClaims::new("u1"), Duration::seconds(60), SECRET, issued_at).unwrap();
        assert!(verify::<TokenClaims>(&token, SECRET).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        let err = verify::<TokenClaims>("not.a.jwt", SECRET).unwrap_err();
        assert!(matches!(err, AuthError::Authentication(_)));
    }

    #[test]
    fn issue_rejects_zero_ttl() {
        let err = issue(&TokenClaims::new("u1"), Duration::zero(), SECRET).unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[test]
    fn issue_rejects_unrepresentable_expiry() {
        let ttl = Duration::try_seconds(1_000_000_000_000_000).unwrap();
        let err = issue(&TokenClaims::new("u1"), ttl, SECRET).unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));

        let svc = TokenService::new("session", Duration::MAX, "reset");
        assert!(matches!(svc.issue_session("id-1"), Err(AuthError::Internal(_))));
    }

    #[test]
    fn reset_and_session_tokens_are_not_interchangeable() {
        let svc = TokenService::new("session", Duration::seconds(3600), "reset");

        let reset = svc.issue_reset("alice@example.com").unwrap();
        assert!(svc.verify_session(&reset).is_err());
        assert_eq!(svc.verify_reset(&reset).unwrap().sub, "alice@example.com");

        let session = svc.issue_session("id-1").unwrap();
        assert!(svc.verify_reset(&session).is_err());
        assert_eq!(svc.verify_session(&session).unwrap().sub, "id-1");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let svc = TokenService::new("very-secret", Duration::seconds(60), "reset-secret");
        let out = format!("{svc:?}");
        assert!(!out.contains("very-secret"));
        assert!(!out.contains("reset-secret"));
    }
}
