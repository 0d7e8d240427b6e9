use axum::{
    body::Body,
    http::{Request, header::ACCESS_CONTROL_ALLOW_ORIGIN},
    middleware::Next,
    response::Response,
};

/// Logs every finished request together with the CORS origin it was
/// answered with.
pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;

    let allow_origin = response
        .headers()
        .get(ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info!(
        status = response.status().as_u16(),
        allow_origin,
        "[{}] {}",
        method,
        uri
    );

    response
}
