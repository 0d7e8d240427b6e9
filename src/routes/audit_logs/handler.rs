use axum::extract::{Json, Query, State};

use super::model::AuditLog;
use crate::{
    AppState,
    common::{ApiResponse, PageQuery, PaginatedResponse},
    error::AppError,
    middleware::CurrentUser,
    utils::success_to_api_response,
};

#[axum::debug_handler]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<AuditLog>>>, AppError> {
    let items = AuditLog::list(&state.pool, query.per_page(), query.offset()).await?;
    let total = AuditLog::count(&state.pool).await?;
    Ok(success_to_api_response(query.paginate(items, total)))
}
