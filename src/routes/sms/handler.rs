use axum::extract::{Json, Query, State};

use super::model::{SendSmsRequest, SendSmsResponse, SmsMessage, normalize_recipients};
use crate::{
    AppState,
    common::{ApiResponse, PageQuery, PaginatedResponse},
    error::AppError,
    middleware::CurrentUser,
    routes::{
        audit_logs::{AuditEntry, AuditLog},
        templates::Template,
    },
    utils::success_to_api_response,
};

/// Queues a notice for each recipient. Delivery is handled outside this
/// service; rows stay `queued` until a sender picks them up.
#[axum::debug_handler]
pub async fn send_sms(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<SendSmsRequest>,
) -> Result<Json<ApiResponse<SendSmsResponse>>, AppError> {
    let recipients = normalize_recipients(&req.recipients)?;

    let message = match (req.inline_message()?, req.template_id) {
        (Some(message), _) => message,
        (None, Some(template_id)) => {
            Template::find_by_id(&state.pool, template_id)
                .await?
                .ok_or(AppError::NotFound("template"))?
                .content
        }
        (None, None) => {
            return Err(AppError::Validation(
                "either message or template_id is required".into(),
            ));
        }
    };

    let queued =
        SmsMessage::queue_batch(&state.pool, &recipients, &message, req.template_id, user.id)
            .await?;
    AuditLog::record(
        &state.pool,
        AuditEntry {
            user_id: Some(user.id),
            action: "SEND_SMS",
            entity: "sms_message",
            entity_id: req.template_id,
            details: Some(format!("{} recipient(s)", recipients.len())),
        },
    )
    .await;

    tracing::info!("User {} queued {} SMS notice(s)", user.id, queued);
    Ok(success_to_api_response(SendSmsResponse { queued, recipients }))
}

#[axum::debug_handler]
pub async fn sms_history(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<SmsMessage>>>, AppError> {
    let items = SmsMessage::list(&state.pool, query.per_page(), query.offset()).await?;
    let total = SmsMessage::count(&state.pool).await?;
    Ok(success_to_api_response(query.paginate(items, total)))
}
