//! Cookie-backed sessions persisted in a relational store.
//!
//! Payloads keep the express-session JSON shape (`cookie`, `user`, plus free
//! keys) so rows written by the previous server stay readable.

mod cookie;
mod handle;
mod layer;
mod memory;
mod mysql;
mod store;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use cookie::{sign_session_id, verify_signed_cookie};
pub use handle::Session;
pub use layer::session_middleware;
pub use memory::InMemorySessionStore;
pub use mysql::MySqlSessionStore;
pub use store::{SessionMap, SessionStore, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    /// Milliseconds, as express-session records it.
    #[serde(default)]
    pub original_max_age: Option<i64>,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: Option<String>,
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    "/".to_string()
}

impl SessionCookie {
    pub fn new(max_age: Duration, secure: bool, same_site: &str) -> Self {
        Self {
            original_max_age: Some(max_age.num_milliseconds()),
            expires: None,
            http_only: true,
            secure,
            same_site: Some(same_site.to_string()),
            path: default_path(),
        }
    }

    /// Parsed `expires`. Missing or unparseable values yield `None`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at(), Some(expires) if expires < now)
    }

    pub fn set_expires(&mut self, expires: DateTime<Utc>) {
        self.expires = Some(expires.to_rfc3339_opts(SecondsFormat::Millis, true));
    }

    /// Slides the expiry to `now + originalMaxAge`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if let Some(max_age) = self.original_max_age {
            self.set_expires(now + Duration::milliseconds(max_age));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub cookie: SessionCookie,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("session payload is not a JSON object")]
    NotAnObject,
    #[error("session payload has an unexpected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

impl SessionRecord {
    pub fn new(cookie: SessionCookie) -> Self {
        Self {
            cookie,
            user: None,
            extra: Map::new(),
        }
    }

    pub fn from_payload(payload: &Value) -> Result<Self, PayloadError> {
        if !payload.is_object() {
            return Err(PayloadError::NotAnObject);
        }
        Ok(serde_json::from_value(payload.clone())?)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.cookie.is_expired_at(now)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_express_session_payload() {
        let payload = json!({
            "cookie": {
                "originalMaxAge": 86400000,
                "expires": "2025-03-01T10:00:00.000Z",
                "httpOnly": true,
                "secure": false,
                "sameSite": "lax",
                "path": "/"
            },
            "user": { "id": 42, "username": "osca.admin", "role": "admin" },
            "views": 3
        });

        let record = SessionRecord::from_payload(&payload).unwrap();
        assert_eq!(record.user.as_ref().map(|u| u.id), Some(42));
        assert_eq!(record.extra.get("views"), Some(&json!(3)));
        assert_eq!(
            record.cookie.expires_at(),
            Some("2025-03-01T10:00:00Z".parse().unwrap())
        );
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = SessionRecord::from_payload(&json!("garbage")).unwrap_err();
        assert!(matches!(err, PayloadError::NotAnObject));
    }

    #[test]
    fn expiry_comparison_is_strict() {
        let now: DateTime<Utc> = "2025-03-01T10:00:00Z".parse().unwrap();
        let mut cookie = SessionCookie::default();

        cookie.set_expires(now);
        assert!(!cookie.is_expired_at(now));

        cookie.set_expires(now - Duration::milliseconds(1));
        assert!(cookie.is_expired_at(now));

        cookie.set_expires(now + Duration::hours(1));
        assert!(!cookie.is_expired_at(now));
    }

    #[test]
    fn missing_or_garbled_expiry_never_expires() {
        let now = Utc::now();
        let mut cookie = SessionCookie::default();
        assert!(!cookie.is_expired_at(now));

        cookie.expires = Some("yesterday".into());
        assert!(!cookie.is_expired_at(now));
    }

    #[test]
    fn touch_slides_expiry_by_max_age() {
        let now: DateTime<Utc> = "2025-03-01T10:00:00Z".parse().unwrap();
        let mut cookie = SessionCookie::new(Duration::hours(24), false, "lax");
        cookie.touch(now);
        assert_eq!(cookie.expires_at(), Some(now + Duration::hours(24)));
        assert_eq!(cookie.expires.as_deref(), Some("2025-03-02T10:00:00.000Z"));
    }
}
