//! # warden_api
//!
//! HTTP API library for Warden.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod policy;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use warden_core::lifecycle::PasswordLifecycle;
use warden_core::mail::{MailDispatch, Notifier};
use warden_core::store::CredentialStore;

use crate::config::ApiConfig;
use crate::handlers::{auth, health, user};

/// Shared application state passed to all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Credential lifecycle operations.
    pub users: PasswordLifecycle,
}

impl AppState {
    /// Wire the lifecycle manager from its collaborators.
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn CredentialStore>,
        mailer: Arc<dyn MailDispatch>,
    ) -> Self {
        let users = PasswordLifecycle::new(
            store,
            config.token_service(),
            Notifier::new(mailer),
            config.notification_settings(),
        );
        Self {
            config: Arc::new(config),
            users,
        }
    }
}

/// Builds the Axum router with all routes and shared state.
///
/// Every route runs its [`policy::Strategy`] via
/// [`middleware::auth::authorize`] before the handler.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route(policy::AUTH_LOGIN, post(auth::login_handler))
        .route(policy::USER, post(user::create_user_handler))
        .route(policy::USER_PROFILE, get(user::profile_handler))
        .route(policy::USER_LIST, get(user::list_users_handler))
        .route(
            policy::USER_ID,
            put(user::update_user_handler).delete(user::delete_user_handler),
        )
        .route(
            policy::USER_FORGOT_PASSWORD,
            post(user::forgot_password_handler),
        )
        .route(
            policy::USER_RESET_CONFIRM,
            get(user::validate_reset_handler).put(user::reset_password_handler),
        )
        .route(policy::HEALTH, get(health::health_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::authorize,
        ));

    let prefix = state.config.route_prefix();
    let app = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(&prefix, api)
    };

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
