use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};

use super::model::{Official, OfficialRequest};
use crate::{
    AppState,
    common::ApiResponse,
    error::AppError,
    middleware::CurrentUser,
    routes::audit_logs::{AuditEntry, AuditLog},
    utils::success_to_api_response,
};

#[axum::debug_handler]
pub async fn list_officials(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<ApiResponse<Vec<Official>>>, AppError> {
    let officials = Official::list(&state.pool).await?;
    Ok(success_to_api_response(officials))
}

#[axum::debug_handler]
pub async fn get_official(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Official>>, AppError> {
    match Official::find_by_id(&state.pool, id).await? {
        Some(official) => Ok(success_to_api_response(official)),
        None => Err(AppError::NotFound("official")),
    }
}

#[axum::debug_handler]
pub async fn create_official(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<OfficialRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Official>>), AppError> {
    let valid = req.validate()?;
    let id = Official::create(&state.pool, &valid).await?;
    AuditLog::record(
        &state.pool,
        AuditEntry {
            user_id: Some(user.id),
            action: "CREATE",
            entity: "official",
            entity_id: Some(id),
            details: Some(format!("{} ({})", valid.name, valid.position)),
        },
    )
    .await;

    let official = Official::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound("official"))?;
    Ok((StatusCode::CREATED, success_to_api_response(official)))
}

#[axum::debug_handler]
pub async fn update_official(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<OfficialRequest>,
) -> Result<Json<ApiResponse<Official>>, AppError> {
    let valid = req.validate()?;
    Official::update(&state.pool, id, &valid).await?;
    // MySQL reports unchanged rows as unaffected, so existence is checked by reading back.
    let official = Official::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound("official"))?;
    AuditLog::record(
        &state.pool,
        AuditEntry {
            user_id: Some(user.id),
            action: "UPDATE",
            entity: "official",
            entity_id: Some(id),
            details: Some(format!("{} ({})", valid.name, valid.position)),
        },
    )
    .await;

    Ok(success_to_api_response(official))
}

#[axum::debug_handler]
pub async fn delete_official(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if !Official::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("official"));
    }
    AuditLog::record(
        &state.pool,
        AuditEntry {
            user_id: Some(user.id),
            action: "DELETE",
            entity: "official",
            entity_id: Some(id),
            details: None,
        },
    )
    .await;

    Ok(success_to_api_response(()))
}
