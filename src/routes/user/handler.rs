use axum::extract::{Json, State};

use super::model::{LoginRequest, LoginResponse, STATUS_INACTIVE, User};
use crate::{
    AppState,
    common::ApiResponse,
    error::AppError,
    middleware::CurrentUser,
    routes::audit_logs::{AuditEntry, AuditLog},
    session::{Session, SessionUser},
    utils::success_to_api_response,
};

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    req.validate()?;

    let Some(user) = User::find_by_username(&state.pool, req.username.trim()).await? else {
        tracing::info!("Login attempt for unknown user {}", req.username.trim());
        return Err(AppError::InvalidCredentials);
    };
    if !user.verify_login(&req.password)? {
        tracing::info!("Login attempt with wrong password for user {}", user.id);
        return Err(AppError::InvalidCredentials);
    }

    session.set_user(SessionUser {
        id: user.id,
        username: Some(user.username.clone()),
        role: Some(user.role.clone()),
    });
    User::mark_logged_in(&state.pool, user.id).await?;
    AuditLog::record(
        &state.pool,
        AuditEntry {
            user_id: Some(user.id),
            action: "LOGIN",
            entity: "user",
            entity_id: Some(user.id),
            details: None,
        },
    )
    .await;

    tracing::info!("User {} logged in", user.id);
    Ok(success_to_api_response(LoginResponse {
        id: user.id,
        username: user.username,
        role: user.role,
    }))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<()>>, AppError> {
    session.destroy();
    User::set_status(&state.pool, user.id, STATUS_INACTIVE).await?;
    AuditLog::record(
        &state.pool,
        AuditEntry {
            user_id: Some(user.id),
            action: "LOGOUT",
            entity: "user",
            entity_id: Some(user.id),
            details: None,
        },
    )
    .await;

    tracing::info!("User {} logged out", user.id);
    Ok(success_to_api_response(()))
}

#[axum::debug_handler]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<ApiResponse<SessionUser>> {
    success_to_api_response(user)
}
