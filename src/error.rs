use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::common::ApiResponse;
use crate::session::StoreError;
use crate::utils::error_codes;

pub const GENERIC_SERVER_ERROR: &str = "Something went wrong on the server!";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("session store error: {0}")]
    SessionStore(#[from] StoreError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),
    #[error("session middleware is not installed")]
    SessionMissing,
}

/// Body returned for uncaught failures; details stay in the server log.
#[derive(Serialize)]
pub struct ErrorMessage {
    pub message: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, msg) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                error_codes::AUTH_REQUIRED,
                "Not logged in".to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                error_codes::AUTH_FAILED,
                self.to_string(),
            ),
            AppError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                error_codes::VALIDATION_ERROR,
                message.clone(),
            ),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND, self.to_string()),
            AppError::Database(_)
            | AppError::SessionStore(_)
            | AppError::Serialization(_)
            | AppError::Password(_)
            | AppError::SessionMissing => {
                tracing::error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_codes::INTERNAL_ERROR,
                    GENERIC_SERVER_ERROR.to_string(),
                )
            }
        };

        let body = Json(ApiResponse::<()> {
            code,
            msg,
            resp_data: None,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_status() {
        assert_eq!(
            AppError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Validation("name is required".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("official").into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn internal_errors_become_500() {
        let response = AppError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
