//! Authorization middleware — runs the route's [`Strategy`] before its handler.

use axum::body::{Body, to_bytes};
use axum::extract::{MatchedPath, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;
use uuid::Uuid;
use warden_core::auth::secrets_match;

use crate::AppState;
use crate::error::AppError;
use crate::models::LoginRequest;
use crate::policy::{Strategy, strategy_for};

/// Upper bound on a login body.
const LOGIN_BODY_LIMIT: usize = 16 * 1024;

/// Caller identity resolved by `BearerToken` or `LoginCredential`,
/// stored in request extensions for the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
}

impl Strategy {
    /// Allow the request (possibly enriched with an [`AuthenticatedUser`]) or deny it.
    pub async fn authorize(self, state: &AppState, request: Request) -> Result<Request, AppError> {
        match self {
            Strategy::Bypass => Ok(request),
            Strategy::StaticSecret => static_secret(state, request),
            Strategy::BearerToken => bearer_token(state, request),
            Strategy::LoginCredential => login_credential(state, request).await,
        }
    }
}

/// Axum middleware: looks up the matched route in the policy table and
/// short-circuits with an error response on denial.
pub async fn authorize(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let matched = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let prefix = state.config.route_prefix();
    let route = matched.strip_prefix(prefix.as_str()).unwrap_or(&matched);

    let strategy = strategy_for(request.method(), route);
    let method = request.method().clone();
    let request = strategy.authorize(&state, request).await.inspect_err(|e| {
        debug!(%method, route, ?strategy, reason = %e, "request denied");
    })?;

    Ok(next.run(request).await)
}

fn static_secret(state: &AppState, request: Request) -> Result<Request, AppError> {
    let supplied = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Forbidden("Missing provisioning credential".into()))?;

    if !secrets_match(supplied, &state.config.provisioning_secret) {
        return Err(AppError::Forbidden("Invalid provisioning credential".into()));
    }
    Ok(request)
}

fn bearer_token(state: &AppState, mut request: Request) -> Result<Request, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))?;

    let claims = state
        .users
        .tokens()
        .verify_session(token)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;
    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    request.extensions_mut().insert(AuthenticatedUser { id });
    Ok(request)
}

async fn login_credential(state: &AppState, request: Request) -> Result<Request, AppError> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, LOGIN_BODY_LIMIT)
        .await
        .map_err(|_| AppError::Validation("login body too large or unreadable".into()))?;
    let login: LoginRequest = serde_json::from_slice(&bytes)
        .map_err(|e| AppError::Validation(format!("invalid login body: {e}")))?;

    let credential = state
        .users
        .authenticate(&login.identifier, &login.secret)
        .await?;

    let mut request = Request::from_parts(parts, Body::from(bytes));
    request
        .extensions_mut()
        .insert(AuthenticatedUser { id: credential.id });
    Ok(request)
}
