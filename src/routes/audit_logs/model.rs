use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, MySqlPool};

#[derive(Debug, Serialize, FromRow)]
pub struct AuditLog {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<i64>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A change worth remembering: who did `action` to which `entity`.
#[derive(Debug, Clone)]
pub struct AuditEntry<'a> {
    pub user_id: Option<i64>,
    pub action: &'a str,
    pub entity: &'a str,
    pub entity_id: Option<i64>,
    pub details: Option<String>,
}

impl AuditLog {
    pub async fn insert(pool: &MySqlPool, entry: &AuditEntry<'_>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (user_id, action, entity, entity_id, details, created_at)
            VALUES (?, ?, ?, ?, ?, UTC_TIMESTAMP())
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(entry.entity)
        .bind(entry.entity_id)
        .bind(entry.details.as_deref())
        .execute(pool)
        .await?;

        Ok(result.last_insert_id())
    }

    /// Appends an entry. A failed write is logged and does not fail the
    /// change it describes.
    pub async fn record(pool: &MySqlPool, entry: AuditEntry<'_>) {
        if let Err(e) = Self::insert(pool, &entry).await {
            tracing::warn!(
                "Failed to write audit log for {} {}: {}",
                entry.action,
                entry.entity,
                e
            );
        }
    }

    pub async fn list(pool: &MySqlPool, limit: u32, offset: u64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, user_id, action, entity, entity_id, details, created_at
            FROM audit_logs
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &MySqlPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs")
            .fetch_one(pool)
            .await
    }
}
