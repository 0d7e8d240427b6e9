use axum::Json;
use bcrypt::verify;
use serde::Serialize;

use crate::common::ApiResponse;
use crate::error::AppError;

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: error_codes::SUCCESS,
        msg: "success".into(),
        resp_data: Some(data),
    })
}

pub fn error_to_api_response<T>(code: i32, msg: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        resp_data: None,
    })
}

/// Trims `value` and rejects it when empty or longer than `max` chars.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Like [`required_text`] but blank input becomes `None`.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>, AppError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_text(field, v, max).map(Some),
    }
}

/// Local mobile numbers (`09XXXXXXXXX`) or E.164 (`+639XXXXXXXXX`).
pub fn is_valid_phone_number(number: &str) -> bool {
    let digits = number.strip_prefix('+').unwrap_or(number);
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// Optional contact number: blank becomes `None`, anything else must
/// pass [`is_valid_phone_number`].
pub fn optional_phone(field: &str, value: Option<&str>) -> Result<Option<String>, AppError> {
    let number = optional_text(field, value, 20)?;
    if let Some(n) = &number {
        if !is_valid_phone_number(n) {
            return Err(AppError::Validation(format!("{field} is not a phone number")));
        }
    }
    Ok(number)
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const AUTH_FAILED: i32 = 1002;
    pub const AUTH_REQUIRED: i32 = 1003;
    pub const NOT_FOUND: i32 = 1004;
    pub const INTERNAL_ERROR: i32 = 5000;
}
