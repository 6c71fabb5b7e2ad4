//! Password lifecycle: provisioning, forgotten-password resets, updates and
//! deletion of credential records.
//!
//! A credential is either `Active` or `MustChange`. Creation and
//! forgot-password put it in `MustChange` with a temporary secret; a reset or
//! a voluntary password update returns it to `Active`.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::json;
use tracing::{debug, error, info};
use url::Url;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::auth::jwt::TokenService;
use crate::auth::password::{
    generate_temporary_secret, hash_password, verify_dummy, verify_password,
};
use crate::mail::{MailMessage, Notifier};
use crate::models::credential::{Credential, CredentialPatch, NewCredential};
use crate::store::{CredentialStore, StoreError};

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Template used for provisioning and reset notifications.
pub const PASSWORD_TEMPLATE: &str = "password";

/// Values used to compose password notifications.
#[derive(Debug, Clone)]
pub struct NotificationSettings {
    /// Application name shown in the subject and body.
    pub app_name: String,
    /// Base URL of the front end; the reset link is `{app_url}/reset-password?token=…`.
    pub app_url: Url,
}

/// Requested changes for [`PasswordLifecycle::update`].
///
/// Empty strings are treated the same as absent fields.
#[derive(Debug, Clone, Default)]
pub struct CredentialUpdate {
    pub name: Option<String>,
    pub new_password: Option<String>,
    pub old_password: Option<String>,
}

/// Orchestrates credential state transitions over a store, the token
/// service and the notifier.
#[derive(Clone)]
pub struct PasswordLifecycle {
    store: Arc<dyn CredentialStore>,
    tokens: TokenService,
    notifier: Notifier,
    settings: NotificationSettings,
}

impl PasswordLifecycle {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: TokenService,
        notifier: Notifier,
        settings: NotificationSettings,
    ) -> Self {
        Self {
            store,
            tokens,
            notifier,
            settings,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Provision a credential with a temporary secret and notify its owner.
    pub async fn create(&self, name: &str, email: &str) -> Result<Uuid, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::Validation("name is required".into()));
        }
        let email = normalize_email(email);
        if !is_plausible_email(&email) {
            return Err(AuthError::Validation("email must be a valid address".into()));
        }

        let temporary = generate_temporary_secret();
        let credential = self
            .store
            .insert(NewCredential {
                id: Uuid::now_v7(),
                name: name.to_string(),
                email,
                password_hash: hash_password(&temporary)?,
                must_change_password: true,
            })
            .await?;

        info!(id = %credential.id, "credential created");
        self.notify_password(&credential, &temporary);
        Ok(credential.id)
    }

    /// Issue a new temporary secret for `email`.
    ///
    /// Unknown emails are ignored. A credential already awaiting a reset is
    /// left alone unless `retry_requested` is set.
    pub async fn forgot_password(&self, email: &str, retry_requested: bool) -> Result<(), AuthError> {
        let email = normalize_email(email);
        let Some(credential) = self.store.find_by_email(&email).await? else {
            debug!("forgot-password for unknown email ignored");
            return Ok(());
        };
        if credential.must_change_password && !retry_requested {
            debug!(id = %credential.id, "reset already pending, not re-sending");
            return Ok(());
        }

        let temporary = generate_temporary_secret();
        let patch = CredentialPatch::password(
            &credential.password_hash,
            hash_password(&temporary)?,
            true,
        );
        match self.store.update_fields(credential.id, patch).await {
            Ok(_) => {}
            // Someone else reset or removed it in between; their outcome stands.
            Err(StoreError::Stale | StoreError::NotFound) => {
                debug!(id = %credential.id, "concurrent change, forgot-password skipped");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        info!(id = %credential.id, retry = retry_requested, "temporary password reissued");
        self.notify_password(&credential, &temporary);
        Ok(())
    }

    /// Check that `token` is a live reset token for a credential awaiting a reset.
    pub async fn validate_reset_token(&self, token: &str) -> Result<Credential, AuthError> {
        let claims = self.tokens.verify_reset(token)?;
        match self.store.find_by_email(&claims.sub).await? {
            Some(credential) if credential.must_change_password => Ok(credential),
            _ => Err(AuthError::Unqualified("unqualified user".into())),
        }
    }

    /// Replace the temporary secret using a reset token.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<Uuid, AuthError> {
        if new_password.is_empty() {
            return Err(AuthError::Validation("password is required".into()));
        }
        let credential = self.validate_reset_token(token).await?;
        ensure_new_password_differs(new_password, &credential.password_hash)?;

        let patch = CredentialPatch::password(
            &credential.password_hash,
            hash_password(new_password)?,
            false,
        );
        self.store.update_fields(credential.id, patch).await?;
        info!(id = %credential.id, "password reset completed");
        Ok(credential.id)
    }

    /// Change the name and/or password of a credential.
    pub async fn update(&self, id: Uuid, update: CredentialUpdate) -> Result<Uuid, AuthError> {
        let credential = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AuthError::NotFound("user not found".into()))?;

        let mut patch = CredentialPatch {
            name: non_empty(update.name.map(|name| name.trim().to_string())),
            ..CredentialPatch::default()
        };

        if let Some(new_password) = non_empty(update.new_password) {
            let old_password = non_empty(update.old_password)
                .ok_or_else(|| AuthError::Validation("old password required".into()))?;
            if !verify_password(&old_password, &credential.password_hash)? {
                return Err(AuthError::Authentication("invalid old password".into()));
            }
            ensure_new_password_differs(&new_password, &credential.password_hash)?;

            patch.password_hash = Some(hash_password(&new_password)?);
            patch.must_change_password = Some(false);
            patch.expected_hash = Some(credential.password_hash.clone());
        }

        if patch.is_empty() {
            return Err(AuthError::Validation("nothing to update".into()));
        }

        let password_changed = patch.password_hash.is_some();
        self.store.update_fields(id, patch).await?;
        info!(id = %id, password_changed, "credential updated");
        Ok(id)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Uuid, AuthError> {
        if !self.store.delete(id).await? {
            return Err(AuthError::NotFound("user not found".into()));
        }
        info!(id = %id, "credential deleted");
        Ok(id)
    }

    pub async fn profile(&self, id: Uuid) -> Result<Credential, AuthError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AuthError::NotFound("user not found".into()))
    }

    pub async fn list(&self) -> Result<Vec<Credential>, AuthError> {
        Ok(self.store.list().await?)
    }

    /// Check a login identifier (email) and secret.
    ///
    /// Unknown identifiers and wrong secrets fail identically, and both pay
    /// one bcrypt comparison.
    pub async fn authenticate(&self, identifier: &str, secret: &str) -> Result<Credential, AuthError> {
        let email = normalize_email(identifier);
        let Some(credential) = self.store.find_by_email(&email).await? else {
            verify_dummy(secret);
            return Err(invalid_credentials());
        };
        if !verify_password(secret, &credential.password_hash)? {
            return Err(invalid_credentials());
        }
        Ok(credential)
    }

    /// Session token for an authenticated credential.
    pub fn issue_session(&self, id: Uuid) -> Result<String, AuthError> {
        self.tokens.issue_session(&id.to_string())
    }

    /// Send the temporary secret and a reset link. Failures are logged only.
    fn notify_password(&self, credential: &Credential, temporary: &str) {
        let token = match self.tokens.issue_reset(&credential.email) {
            Ok(token) => token,
            Err(e) => {
                error!(id = %credential.id, error = %e, "reset token issuance failed, notification skipped");
                return;
            }
        };
        let app_name = &self.settings.app_name;
        self.notifier.dispatch(MailMessage {
            to: credential.email.clone(),
            subject: format!("Configure your {app_name} password"),
            template: PASSWORD_TEMPLATE.to_string(),
            context: json!({
                "username": credential.name,
                "resetUrl": reset_link(&self.settings.app_url, &token).as_str(),
                "temporaryPassword": temporary,
                "appName": app_name,
            }),
        });
    }
}

impl std::fmt::Debug for PasswordLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordLifecycle")
            .field("tokens", &self.tokens)
            .field("notifier", &self.notifier)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn invalid_credentials() -> AuthError {
    AuthError::Authentication("Invalid credentials".into())
}

fn ensure_new_password_differs(new_password: &str, current_hash: &str) -> Result<(), AuthError> {
    if verify_password(new_password, current_hash)? {
        return Err(AuthError::Conflict(
            "new password must be different from the last one".into(),
        ));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Emails are compared trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `local@domain.tld` with no whitespace; expects normalized input.
fn is_plausible_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}

/// `{base}/reset-password?token=…`
pub fn reset_link(base: &Url, token: &str) -> Url {
    let mut link = base.clone();
    if let Ok(mut segments) = link.path_segments_mut() {
        segments.pop_if_empty().push("reset-password");
    }
    link.query_pairs_mut().clear().append_pair("token", token);
    link
}
