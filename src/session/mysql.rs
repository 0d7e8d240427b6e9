use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::MySqlPool;

use super::SessionRecord;
use super::store::{SessionMap, SessionStore, StoreError, expiry_timestamp};

const DEFAULT_EXPIRATION_SECS: i64 = 60 * 60 * 24;

/// One `sessions` row as the sweep sees it. Unparseable or NULL data stays
/// visible as a JSON string so it is reported as malformed, not dropped.
fn decode_row(sid: String, data: Option<Vec<u8>>) -> (String, Value) {
    let raw = data.unwrap_or_default();
    let payload = serde_json::from_slice(&raw)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&raw).into_owned()));
    (sid, payload)
}

/// Session table compatible with express-mysql-session's default schema.
#[derive(Clone)]
pub struct MySqlSessionStore {
    pool: MySqlPool,
    expiration_secs: i64,
}

impl MySqlSessionStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            expiration_secs: DEFAULT_EXPIRATION_SECS,
        }
    }

    pub fn with_expiration(mut self, secs: i64) -> Self {
        self.expiration_secs = secs;
        self
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                session_id VARCHAR(128) COLLATE utf8mb4_bin NOT NULL,
                expires INT(11) UNSIGNED NOT NULL,
                data MEDIUMTEXT COLLATE utf8mb4_bin,
                PRIMARY KEY (session_id)
            ) ENGINE=InnoDB
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MySqlSessionStore {
    async fn get(&self, sid: &str) -> Result<Option<SessionRecord>, StoreError> {
        // Binary-collated text decodes as bytes.
        let row: Option<(i64, Option<Vec<u8>>)> = sqlx::query_as(
            "SELECT CAST(expires AS SIGNED), data FROM sessions WHERE session_id = ?",
        )
        .bind(sid)
        .fetch_optional(&self.pool)
        .await?;

        let Some((expires, data)) = row else {
            return Ok(None);
        };
        if expires < Utc::now().timestamp() {
            return Ok(None);
        }

        match data.as_deref().map(serde_json::from_slice::<SessionRecord>) {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => {
                tracing::warn!("Discarding unreadable session {}: {}", sid, e);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, sid: &str, record: &SessionRecord) -> Result<(), StoreError> {
        let expires = expiry_timestamp(record, Utc::now(), self.expiration_secs);
        let data = serde_json::to_string(record)?;

        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, expires, data)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE expires = VALUES(expires), data = VALUES(data)
            "#,
        )
        .bind(sid)
        .bind(expires)
        .bind(data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn touch(&self, sid: &str, record: &SessionRecord) -> Result<(), StoreError> {
        let expires = expiry_timestamp(record, Utc::now(), self.expiration_secs);
        let cookie = serde_json::to_string(&record.cookie)?;

        sqlx::query(
            r#"
            UPDATE sessions
            SET expires = ?, data = JSON_SET(data, '$.cookie', CAST(? AS JSON))
            WHERE session_id = ?
            "#,
        )
        .bind(expires)
        .bind(cookie)
        .bind(sid)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn destroy(&self, sid: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE session_id = ?")
            .bind(sid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn all(&self) -> Result<SessionMap, StoreError> {
        let rows: Vec<(String, Option<Vec<u8>>)> =
            sqlx::query_as("SELECT CAST(session_id AS CHAR), data FROM sessions")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(sid, data)| decode_row(sid, data)).collect())
    }

    async fn clear_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires < ?")
            .bind(now.timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
