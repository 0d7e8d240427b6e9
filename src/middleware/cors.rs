use std::time::Duration;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, CorsLayer};

/// Credentialed CORS for the single configured frontend origin. Requested
/// headers are mirrored back, since credentials rule out a wildcard.
pub fn frontend_cors(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60));

    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!("FRONTEND_URL is not a valid origin, cross-origin requests will be refused");
            layer
        }
    }
}
