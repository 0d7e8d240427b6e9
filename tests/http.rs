//! Drives the full router with an in-memory session store. The database
//! pool connects lazily and is never reached by these requests.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    routing::get as route_get,
};
use backend::{
    AppState,
    config::{Config, Environment},
    middleware::handle_panic,
    router::create_router,
    session::{InMemorySessionStore, SessionCookie, SessionRecord, SessionStore, SessionUser, sign_session_id},
};
use chrono::{Duration, Utc};
use sqlx::mysql::MySqlPoolOptions;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;

const FRONTEND: &str = "http://localhost:5173";
const SECRET: &str = "integration-test-secret";

fn test_config(environment: Environment) -> Config {
    Config {
        server_port: 0,
        frontend_url: FRONTEND.into(),
        session_secret: SECRET.into(),
        db_host: "127.0.0.1".into(),
        db_user: "osca".into(),
        db_password: String::new(),
        db_port: 3306,
        db_database: "oscaims_test".into(),
        db_max_connections: 1,
        environment,
        uploads_dir: std::env::temp_dir().to_string_lossy().into_owned(),
        sweep_interval_secs: 300,
        session_max_age_secs: 60 * 60 * 24,
    }
}

fn create_app_with(environment: Environment) -> (Router, Arc<InMemorySessionStore>) {
    let config = test_config(environment);
    let store = Arc::new(InMemorySessionStore::new());
    let state = AppState {
        pool: MySqlPoolOptions::new().connect_lazy_with(config.database_options()),
        config,
        sessions: store.clone(),
    };
    (create_router(state), store)
}

fn create_app() -> (Router, Arc<InMemorySessionStore>) {
    create_app_with(Environment::Development)
}

async fn body_string(body: Body) -> String {
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn session_cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn preflight_returns_configured_origin_with_credentials() {
    let (app, _) = create_app();

    for path in [
        "/api/officials",
        "/api/audit-logs",
        "/api/user/login",
        "/api/senior-citizens",
        "/api/sms/send",
        "/api/templates",
    ] {
        let request = Request::builder()
            .method("OPTIONS")
            .uri(path)
            .header(header::ORIGIN, FRONTEND)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{path}");
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], FRONTEND);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert!(headers.get(header::SET_COOKIE).is_none());
    }
}

#[tokio::test]
async fn allowed_origin_is_always_the_frontend() {
    let (app, _) = create_app();

    let request = Request::builder()
        .uri("/")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    let allowed = &response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN];
    assert_eq!(allowed, FRONTEND);
    assert_ne!(allowed, "https://evil.example");
}

#[tokio::test]
async fn root_says_hello_without_creating_a_session() {
    let (app, store) = create_app();

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_string(response.into_body()).await, "Hello from server!");
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_session_counts_views_across_requests() {
    let (app, store) = create_app();

    let first = app.clone().oneshot(get("/api/test-session")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let set_cookie = first.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("oscaims_sid="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Max-Age=86400"));
    assert!(!set_cookie.contains("Secure"));
    assert_eq!(body_string(first.into_body()).await, "Session views: 1");

    let cookie = session_cookie_pair(&set_cookie);
    let second = app
        .clone()
        .oneshot(get_with_cookie("/api/test-session", &cookie))
        .await
        .unwrap();
    assert_eq!(body_string(second.into_body()).await, "Session views: 2");

    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn tampered_cookie_starts_a_fresh_session() {
    let (app, store) = create_app();

    let first = app.clone().oneshot(get("/api/test-session")).await.unwrap();
    let cookie = session_cookie_pair(first.headers()[header::SET_COOKIE].to_str().unwrap());
    let (name_and_sid, _signature) = cookie.rsplit_once('.').unwrap();
    let forged = format!("{name_and_sid}.{}", "0".repeat(64));

    let second = app
        .oneshot(get_with_cookie("/api/test-session", &forged))
        .await
        .unwrap();

    assert_eq!(body_string(second.into_body()).await, "Session views: 1");
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn production_cookies_are_secure_and_cross_site() {
    let (app, _) = create_app_with(Environment::Production);

    let response = app.oneshot(get("/api/test-session")).await.unwrap();
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();

    assert!(set_cookie.contains("Secure"));
    assert!(set_cookie.contains("SameSite=None"));
}

#[tokio::test]
async fn protected_routes_require_a_session_user() {
    let (app, _) = create_app();

    for path in [
        "/api/officials",
        "/api/audit-logs",
        "/api/senior-citizens",
        "/api/templates",
        "/api/sms/history",
        "/api/user/me",
    ] {
        let response = app.clone().oneshot(get(path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
    }

    let logout = Request::builder()
        .method("POST")
        .uri("/api/user/logout")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(logout).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_the_session_user() {
    let (app, store) = create_app();

    let mut record = SessionRecord::new(SessionCookie::new(Duration::hours(24), false, "lax"));
    record.cookie.touch(Utc::now());
    record.user = Some(SessionUser {
        id: 5,
        username: Some("osca.clerk".into()),
        role: Some("staff".into()),
    });
    store.set("seeded-session", &record).await.unwrap();
    let cookie = format!("oscaims_sid={}", sign_session_id("seeded-session", SECRET));

    let response = app
        .oneshot(get_with_cookie("/api/user/me", &cookie))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    // An unmodified session is touched, not re-issued.
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(body["code"], 0);
    assert_eq!(body["resp_data"]["id"], 5);
    assert_eq!(body["resp_data"]["username"], "osca.clerk");
}

#[tokio::test]
async fn login_rejects_blank_credentials() {
    let (app, _) = create_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/user/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"username": "  ", "password": ""}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(body["code"], 1000);
}

#[tokio::test]
async fn unknown_routes_get_a_json_404() {
    let (app, _) = create_app();

    let response = app.oneshot(get("/api/nothing-here")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(body["code"], 1004);
}

#[tokio::test]
async fn handler_panics_become_generic_500() {
    async fn boom() -> &'static str {
        panic!("database exploded")
    }
    let app = Router::new()
        .route("/boom", route_get(boom))
        .layer(CatchPanicLayer::custom(handle_panic));

    let response = app.oneshot(get("/boom")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response.into_body()).await;
    assert_eq!(body, r#"{"message":"Something went wrong on the server!"}"#);
}
