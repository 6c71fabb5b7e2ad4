//! User provisioning, profile and password lifecycle handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use uuid::Uuid;
use warden_core::lifecycle::CredentialUpdate;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::{ValidJson, ValidQuery};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    CreateUserRequest, ForgotPasswordQuery, ForgotPasswordRequest, MessageResponse,
    ProfileResponse, ResetPasswordRequest, ResetTokenQuery, UpdateUserRequest, UserSummary,
};

/// Ids that are not UUIDs cannot name a stored credential.
fn parse_id(id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| AppError::NotFound("user not found".into()))
}

/// `POST /user` — provision a user with a temporary password (StaticSecret).
pub async fn create_user_handler(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let id = state.users.create(&body.name, &body.email).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(id, "successfully created and notified")),
    ))
}

/// `GET /user/profile` — the caller's own record.
pub async fn profile_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<ProfileResponse>> {
    let credential = state.users.profile(user.id).await?;
    Ok(Json(credential.into()))
}

/// `GET /user/list`
pub async fn list_users_handler(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<UserSummary>>> {
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

/// `PUT /user/{id}` — change name and/or password.
pub async fn update_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UpdateUserRequest>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    let update = CredentialUpdate {
        name: body.name,
        new_password: body.new_password,
        old_password: body.old_password,
    };
    let id = state.users.update(id, update).await?;
    Ok(Json(MessageResponse::new(id, "successfully updated")))
}

/// `DELETE /user/{id}`
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = state.users.delete(parse_id(&id)?).await?;
    Ok(Json(MessageResponse::new(id, "successfully deleted")))
}

/// `POST /user/forgot-password` — always succeeds for well-formed input,
/// whether or not the email is registered.
pub async fn forgot_password_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ForgotPasswordQuery>,
    ValidJson(body): ValidJson<ForgotPasswordRequest>,
) -> AppResult<StatusCode> {
    state
        .users
        .forgot_password(&body.email, query.retry_requested())
        .await?;
    Ok(StatusCode::OK)
}

/// `GET /user/reset/confirm?token=…` — check a reset link before showing the form.
pub async fn validate_reset_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ResetTokenQuery>,
) -> AppResult<StatusCode> {
    state.users.validate_reset_token(&query.token).await?;
    Ok(StatusCode::OK)
}

/// `PUT /user/reset/confirm?token=…` — set the new password.
pub async fn reset_password_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ResetTokenQuery>,
    ValidJson(body): ValidJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let id = state
        .users
        .reset_password(&query.token, &body.password)
        .await?;
    Ok(Json(MessageResponse::new(id, "successfully updated")))
}
