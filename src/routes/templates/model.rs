use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySqlPool};

use crate::error::AppError;
use crate::utils::required_text;

/// Longest body that still fits three concatenated SMS segments.
pub const MAX_CONTENT_CHARS: usize = 459;

#[derive(Debug, Serialize, FromRow)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    pub name: String,
    pub content: String,
}

impl TemplateRequest {
    pub fn validate(self) -> Result<TemplateRequest, AppError> {
        Ok(TemplateRequest {
            name: required_text("name", &self.name, 100)?,
            content: required_text("content", &self.content, MAX_CONTENT_CHARS)?,
        })
    }
}

impl Template {
    pub async fn list(pool: &MySqlPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Template>(
            "SELECT id, name, content, created_at, updated_at FROM sms_templates ORDER BY name",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &MySqlPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Template>(
            "SELECT id, name, content, created_at, updated_at FROM sms_templates WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &MySqlPool, req: &TemplateRequest) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO sms_templates (name, content, created_at, updated_at)
            VALUES (?, ?, UTC_TIMESTAMP(), UTC_TIMESTAMP())
            "#,
        )
        .bind(&req.name)
        .bind(&req.content)
        .execute(pool)
        .await?;

        Ok(result.last_insert_id() as i64)
    }

    pub async fn update(pool: &MySqlPool, id: i64, req: &TemplateRequest) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE sms_templates SET name = ?, content = ?, updated_at = UTC_TIMESTAMP() WHERE id = ?",
        )
        .bind(&req.name)
        .bind(&req.content)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn delete(pool: &MySqlPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sms_templates WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
