use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};

use super::{Session, SessionCookie, SessionRecord, sign_session_id, verify_signed_cookie};
use crate::{
    AppState,
    config::{Config, SESSION_COOKIE_NAME},
    error::AppError,
};

fn same_site(config: &Config) -> SameSite {
    if config.is_production() {
        SameSite::None
    } else {
        SameSite::Lax
    }
}

fn build_session_cookie(signed_value: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, signed_value))
        .path("/")
        .http_only(true)
        .secure(config.is_production())
        .same_site(same_site(config))
        .max_age(time::Duration::seconds(config.session_max_age_secs as i64))
        .build()
}

fn build_removal_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .secure(config.is_production())
        .same_site(same_site(config))
        .max_age(time::Duration::ZERO)
        .build()
}

fn fresh_record(config: &Config) -> SessionRecord {
    let same_site = if config.is_production() { "none" } else { "lax" };
    SessionRecord::new(SessionCookie::new(
        Duration::seconds(config.session_max_age_secs as i64),
        config.is_production(),
        same_site,
    ))
}

fn append_cookie(response: &mut Response, cookie: Cookie<'static>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => tracing::error!("Failed to encode session cookie: {}", e),
    }
}

/// Loads the caller's session before the handler runs and persists it
/// afterwards. New sessions are only stored, and only get a cookie, once
/// a handler writes to them.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let config = &state.config;
    let now = Utc::now();

    let existing_id = jar
        .get(SESSION_COOKIE_NAME)
        .and_then(|cookie| verify_signed_cookie(cookie.value(), &config.session_secret));

    let loaded = match existing_id {
        Some(sid) => match state.sessions.get(&sid).await {
            Ok(Some(record)) => Some((sid, record)),
            Ok(None) => None,
            Err(e) => return AppError::from(e).into_response(),
        },
        None => None,
    };

    let session = match loaded {
        Some((sid, mut record)) => {
            record.cookie.touch(now);
            Session::new(sid, record, false)
        }
        None => {
            let mut record = fresh_record(config);
            record.cookie.touch(now);
            Session::new(uuid::Uuid::new_v4().simple().to_string(), record, true)
        }
    };

    req.extensions_mut().insert(session.clone());
    let mut response = next.run(req).await;

    let (sid, record, is_new, modified, destroyed) = {
        let guard = session.lock();
        (
            guard.id.clone(),
            guard.record.clone(),
            guard.is_new,
            guard.modified,
            guard.destroyed,
        )
    };

    if destroyed {
        if !is_new {
            if let Err(e) = state.sessions.destroy(&sid).await {
                return AppError::from(e).into_response();
            }
        }
        append_cookie(&mut response, build_removal_cookie(config));
    } else if modified {
        if let Err(e) = state.sessions.set(&sid, &record).await {
            return AppError::from(e).into_response();
        }
        let signed = sign_session_id(&sid, &config.session_secret);
        append_cookie(&mut response, build_session_cookie(signed, config));
    } else if !is_new {
        if let Err(e) = state.sessions.touch(&sid, &record).await {
            tracing::warn!("Failed to refresh session {}: {}", sid, e);
        }
    }

    response
}
