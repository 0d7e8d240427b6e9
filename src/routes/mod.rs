pub mod audit_logs;
pub mod officials;
pub mod senior_citizens;
pub mod sms;
pub mod templates;
pub mod user;

use axum::{
    Json,
    http::{StatusCode, Uri},
};

use crate::{
    common::ApiResponse,
    error::AppError,
    session::Session,
    utils::{error_codes, error_to_api_response},
};

/// Counts page views in the session; handy for checking cookies end to end.
#[axum::debug_handler]
pub async fn test_session(session: Session) -> Result<String, AppError> {
    let views = session.get::<u64>("views").unwrap_or(0) + 1;
    session.insert("views", views)?;
    Ok(format!("Session views: {views}"))
}

pub async fn root() -> &'static str {
    "Hello from server!"
}

pub async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        error_to_api_response(error_codes::NOT_FOUND, format!("No route for {}", uri.path())),
    )
}
