use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;

use super::model::{SearchQuery, SeniorCitizen, SeniorCitizenRequest};
use crate::{
    AppState,
    common::{ApiResponse, PageQuery, PaginatedResponse},
    error::AppError,
    middleware::CurrentUser,
    routes::audit_logs::{AuditEntry, AuditLog},
    utils::success_to_api_response,
};

#[axum::debug_handler]
pub async fn list_senior_citizens(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(search): Query<SearchQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<SeniorCitizen>>>, AppError> {
    let items = SeniorCitizen::search(&state.pool, &search, page.per_page(), page.offset()).await?;
    let total = SeniorCitizen::count(&state.pool, &search).await?;
    Ok(success_to_api_response(page.paginate(items, total)))
}

#[axum::debug_handler]
pub async fn get_senior_citizen(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<SeniorCitizen>>, AppError> {
    match SeniorCitizen::find_by_id(&state.pool, id).await? {
        Some(citizen) => Ok(success_to_api_response(citizen)),
        None => Err(AppError::NotFound("senior citizen")),
    }
}

#[axum::debug_handler]
pub async fn create_senior_citizen(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<SeniorCitizenRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SeniorCitizen>>), AppError> {
    let valid = req.validate(Utc::now().date_naive())?;
    let id = SeniorCitizen::create(&state.pool, &valid).await?;
    let citizen = SeniorCitizen::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound("senior citizen"))?;

    AuditLog::record(
        &state.pool,
        AuditEntry {
            user_id: Some(user.id),
            action: "CREATE",
            entity: "senior_citizen",
            entity_id: Some(id),
            details: Some(citizen.full_name()),
        },
    )
    .await;

    Ok((StatusCode::CREATED, success_to_api_response(citizen)))
}

#[axum::debug_handler]
pub async fn update_senior_citizen(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<SeniorCitizenRequest>,
) -> Result<Json<ApiResponse<SeniorCitizen>>, AppError> {
    let valid = req.validate(Utc::now().date_naive())?;
    SeniorCitizen::update(&state.pool, id, &valid).await?;
    let citizen = SeniorCitizen::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound("senior citizen"))?;

    AuditLog::record(
        &state.pool,
        AuditEntry {
            user_id: Some(user.id),
            action: "UPDATE",
            entity: "senior_citizen",
            entity_id: Some(id),
            details: Some(citizen.full_name()),
        },
    )
    .await;

    Ok(success_to_api_response(citizen))
}

#[axum::debug_handler]
pub async fn delete_senior_citizen(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if !SeniorCitizen::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("senior citizen"));
    }
    AuditLog::record(
        &state.pool,
        AuditEntry {
            user_id: Some(user.id),
            action: "DELETE",
            entity: "senior_citizen",
            entity_id: Some(id),
            details: None,
        },
    )
    .await;

    Ok(success_to_api_response(()))
}
