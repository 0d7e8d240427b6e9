//! In-memory session storage for tests and local runs.
//!
//! Sessions are lost when the process restarts.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::SessionRecord;
use super::store::{SessionMap, SessionStore, StoreError, expiry_timestamp};

#[derive(Clone)]
struct StoredSession {
    expires: i64,
    data: Value,
}

#[derive(Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
    fallback_ttl_secs: i64,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            fallback_ttl_secs: 60 * 60 * 24,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, sid: &str) -> Result<Option<SessionRecord>, StoreError> {
        let sessions = self.sessions.read().map_err(|_| StoreError::Poisoned)?;
        let Some(stored) = sessions.get(sid) else {
            return Ok(None);
        };
        if stored.expires < Utc::now().timestamp() {
            return Ok(None);
        }
        Ok(serde_json::from_value(stored.data.clone()).ok())
    }

    async fn set(&self, sid: &str, record: &SessionRecord) -> Result<(), StoreError> {
        let stored = StoredSession {
            expires: expiry_timestamp(record, Utc::now(), self.fallback_ttl_secs),
            data: serde_json::to_value(record)?,
        };
        self.sessions
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(sid.to_owned(), stored);
        Ok(())
    }

    async fn touch(&self, sid: &str, record: &SessionRecord) -> Result<(), StoreError> {
        let expires = expiry_timestamp(record, Utc::now(), self.fallback_ttl_secs);
        if let Some(stored) = self
            .sessions
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .get_mut(sid)
        {
            stored.expires = expires;
            if let Value::Object(data) = &mut stored.data {
                data.insert("cookie".into(), serde_json::to_value(&record.cookie)?);
            }
        }
        Ok(())
    }

    async fn destroy(&self, sid: &str) -> Result<(), StoreError> {
        self.sessions
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .remove(sid);
        Ok(())
    }

    async fn all(&self) -> Result<SessionMap, StoreError> {
        let sessions = self.sessions.read().map_err(|_| StoreError::Poisoned)?;
        Ok(sessions
            .iter()
            .map(|(sid, stored)| (sid.clone(), stored.data.clone()))
            .collect())
    }

    async fn clear_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().map_err(|_| StoreError::Poisoned)?;
        let before = sessions.len();
        sessions.retain(|_, stored| stored.expires >= now.timestamp());
        Ok(u64::try_from(before.saturating_sub(sessions.len())).unwrap_or(u64::MAX))
    }
}
