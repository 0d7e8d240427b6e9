use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::{catch_panic::CatchPanicLayer, compression::CompressionLayer, services::ServeDir};

use crate::{
    AppState,
    middleware::{frontend_cors, handle_panic, log_errors, log_requests},
    routes,
    session::session_middleware,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/api/officials", routes::officials::router())
        .nest("/api/audit-logs", routes::audit_logs::router())
        .nest("/api/user", routes::user::router())
        .nest("/api/senior-citizens", routes::senior_citizens::router())
        .nest("/api/sms", routes::sms::router())
        .nest("/api/templates", routes::templates::router())
        .route("/api/test-session", get(routes::test_session))
        .route("/", get(routes::root))
}

/// The full application: routes, uploads, and the middleware stack.
/// Layers are listed innermost first; CORS and request logging wrap
/// everything so preflights never reach the session layer.
pub fn create_router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.uploads_dir);

    Router::new()
        .merge(api_routes())
        .nest_service("/uploads", uploads)
        .fallback(routes::not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .layer(from_fn(log_errors))
        .layer(CompressionLayer::new())
        .layer(frontend_cors(&state.config.frontend_url))
        .layer(from_fn(log_requests))
        .with_state(state)
}
