use std::sync::{Arc, Mutex, MutexGuard};

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Serialize, de::DeserializeOwned};

use super::{SessionRecord, SessionUser};
use crate::error::AppError;

pub(crate) struct SessionState {
    pub id: String,
    pub record: SessionRecord,
    pub is_new: bool,
    pub modified: bool,
    pub destroyed: bool,
}

/// Per-request view of the caller's session. Writes are flushed to the
/// store by the session middleware once the handler returns.
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    pub(crate) fn new(id: String, record: SessionRecord, is_new: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                id,
                record,
                is_new,
                modified: false,
                destroyed: false,
            })),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn id(&self) -> String {
        self.lock().id.clone()
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.lock().record.user.clone()
    }

    pub fn set_user(&self, user: SessionUser) {
        let mut state = self.lock();
        state.record.user = Some(user);
        state.modified = true;
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lock()
            .record
            .extra
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn insert<T: Serialize>(&self, key: &str, value: T) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        let mut state = self.lock();
        state.record.extra.insert(key.to_owned(), value);
        state.modified = true;
        Ok(())
    }

    /// Drops the session; the store row and the cookie go with it.
    pub fn destroy(&self) {
        let mut state = self.lock();
        state.destroyed = true;
        state.record.user = None;
        state.record.extra.clear();
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AppError::SessionMissing)
    }
}
