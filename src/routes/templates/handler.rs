use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};

use super::model::{Template, TemplateRequest};
use crate::{
    AppState,
    common::ApiResponse,
    error::AppError,
    middleware::CurrentUser,
    routes::audit_logs::{AuditEntry, AuditLog},
    utils::success_to_api_response,
};

#[axum::debug_handler]
pub async fn list_templates(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<ApiResponse<Vec<Template>>>, AppError> {
    Ok(success_to_api_response(Template::list(&state.pool).await?))
}

#[axum::debug_handler]
pub async fn get_template(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Template>>, AppError> {
    Template::find_by_id(&state.pool, id)
        .await?
        .map(success_to_api_response)
        .ok_or(AppError::NotFound("template"))
}

#[axum::debug_handler]
pub async fn create_template(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<TemplateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Template>>), AppError> {
    let req = req.validate()?;
    let id = Template::create(&state.pool, &req).await?;
    AuditLog::record(
        &state.pool,
        AuditEntry {
            user_id: Some(user.id),
            action: "CREATE",
            entity: "sms_template",
            entity_id: Some(id),
            details: Some(req.name.clone()),
        },
    )
    .await;

    let template = Template::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound("template"))?;
    Ok((StatusCode::CREATED, success_to_api_response(template)))
}

#[axum::debug_handler]
pub async fn update_template(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<TemplateRequest>,
) -> Result<Json<ApiResponse<Template>>, AppError> {
    let req = req.validate()?;
    Template::update(&state.pool, id, &req).await?;
    let template = Template::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound("template"))?;

    AuditLog::record(
        &state.pool,
        AuditEntry {
            user_id: Some(user.id),
            action: "UPDATE",
            entity: "sms_template",
            entity_id: Some(id),
            details: Some(req.name),
        },
    )
    .await;

    Ok(success_to_api_response(template))
}

#[axum::debug_handler]
pub async fn delete_template(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if !Template::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("template"));
    }
    AuditLog::record(
        &state.pool,
        AuditEntry {
            user_id: Some(user.id),
            action: "DELETE",
            entity: "sms_template",
            entity_id: Some(id),
            details: None,
        },
    )
    .await;

    Ok(success_to_api_response(()))
}
