//! Authentication request handlers.

use axum::extract::State;
use axum::{Extension, Json};
use tracing::info;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::TokenResponse;

/// `POST /auth/login` — the `LoginCredential` strategy has already checked
/// the body; exchange the resolved identity for a session token.
pub async fn login_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<TokenResponse>> {
    let access_token = state.users.issue_session(user.id)?;
    info!(id = %user.id, "session issued");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.users.tokens().session_ttl().num_seconds(),
    }))
}
