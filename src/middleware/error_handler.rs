use std::any::Any;

use axum::{
    Json,
    body::{Body, HttpBody, to_bytes},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::error::{ErrorMessage, GENERIC_SERVER_ERROR};

const LOGGED_BODY_LIMIT: usize = 1024;

pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = next.run(req).await;

    if !response.status().is_server_error() {
        return response;
    }

    // Only small bodies of known length are buffered for the log; the rest
    // stream through untouched.
    let small = response
        .body()
        .size_hint()
        .exact()
        .is_some_and(|len| len <= LOGGED_BODY_LIMIT as u64);
    if !small {
        error!(
            "Server error on [{}] {} - Status: {}, Body: <not logged>",
            method,
            uri,
            response.status()
        );
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, LOGGED_BODY_LIMIT).await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to read error response body: {}", e);
            return Response::from_parts(parts, Body::empty());
        }
    };
    let body_str = String::from_utf8_lossy(&bytes);

    error!(
        "Server error on [{}] {} - Status: {}, Body: {}",
        method, uri, parts.status, body_str
    );

    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}

/// Catch-all for handler panics: log the payload, answer with a generic 500.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!("Request handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorMessage {
            message: GENERIC_SERVER_ERROR,
        }),
    )
        .into_response()
}
