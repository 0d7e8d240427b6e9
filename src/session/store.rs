use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::SessionRecord;

/// Raw payloads keyed by session id. Entries are not validated; callers
/// decide what to do with payloads that fail to parse.
pub type SessionMap = BTreeMap<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("session payload could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("session store lock poisoned")]
    Poisoned,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session unless it is missing or past its store expiry.
    async fn get(&self, sid: &str) -> Result<Option<SessionRecord>, StoreError>;

    async fn set(&self, sid: &str, record: &SessionRecord) -> Result<(), StoreError>;

    /// Refreshes the stored expiry without rewriting the payload.
    async fn touch(&self, sid: &str, record: &SessionRecord) -> Result<(), StoreError>;

    async fn destroy(&self, sid: &str) -> Result<(), StoreError>;

    /// Every stored session, expired ones included.
    async fn all(&self) -> Result<SessionMap, StoreError>;

    /// Deletes rows whose store expiry is before `now`; returns how many.
    async fn clear_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Unix seconds the store keeps next to a payload. Falls back to
/// `now + fallback_secs` when the cookie carries no usable expiry.
pub(crate) fn expiry_timestamp(record: &SessionRecord, now: DateTime<Utc>, fallback_secs: i64) -> i64 {
    record
        .cookie
        .expires_at()
        .map(|expires| expires.timestamp())
        .unwrap_or_else(|| now.timestamp() + fallback_secs)
}
