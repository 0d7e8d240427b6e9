use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

use crate::error::AppError;
use crate::routes::templates::MAX_CONTENT_CHARS;
use crate::utils::{is_valid_phone_number, optional_text};

pub const STATUS_QUEUED: &str = "queued";
pub const MAX_RECIPIENTS: usize = 1000;

#[derive(Debug, Serialize, FromRow)]
pub struct SmsMessage {
    pub id: i64,
    pub recipient: String,
    pub message: String,
    pub template_id: Option<i64>,
    pub status: String,
    pub sent_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SendSmsRequest {
    pub recipients: Vec<String>,
    pub message: Option<String>,
    pub template_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SendSmsResponse {
    pub queued: u64,
    pub recipients: Vec<String>,
}

/// Trims, validates and de-duplicates recipient numbers, keeping the first
/// occurrence order.
pub fn normalize_recipients(recipients: &[String]) -> Result<Vec<String>, AppError> {
    let mut seen = BTreeSet::new();
    let mut unique = Vec::new();
    for raw in recipients {
        let number = raw.trim();
        if !is_valid_phone_number(number) {
            return Err(AppError::Validation(format!("invalid recipient number {number}")));
        }
        if seen.insert(number.to_string()) {
            unique.push(number.to_string());
        }
    }

    if unique.is_empty() {
        return Err(AppError::Validation("at least one recipient is required".into()));
    }
    if unique.len() > MAX_RECIPIENTS {
        return Err(AppError::Validation(format!(
            "at most {MAX_RECIPIENTS} recipients per send"
        )));
    }
    Ok(unique)
}

impl SendSmsRequest {
    /// Inline message text, if one was given.
    pub fn inline_message(&self) -> Result<Option<String>, AppError> {
        optional_text("message", self.message.as_deref(), MAX_CONTENT_CHARS)
    }
}

impl SmsMessage {
    /// Records one queued row per recipient in a single insert.
    pub async fn queue_batch(
        pool: &MySqlPool,
        recipients: &[String],
        message: &str,
        template_id: Option<i64>,
        sent_by: i64,
    ) -> Result<u64, sqlx::Error> {
        if recipients.is_empty() {
            return Ok(0);
        }

        let mut builder = queue_query(recipients, message, template_id, sent_by);
        let result = builder.build().execute(pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn list(pool: &MySqlPool, limit: u32, offset: u64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SmsMessage>(
            r#"
            SELECT id, recipient, message, template_id, status, sent_by, created_at
            FROM sms_messages
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
        sqlx::query_scalar("SELECT COUNT(*) FROM sms_messages")
            .fetch_one(pool)
            .await
    }
}

fn queue_query<'a>(
    recipients: &'a [String],
    message: &'a str,
    template_id: Option<i64>,
    sent_by: i64,
) -> QueryBuilder<'a, MySql> {
    let mut builder = QueryBuilder::<MySql>::new(
        "INSERT INTO sms_messages (recipient, message, template_id, status, sent_by, created_at) ",
    );
    builder.push_values(recipients, |mut row, recipient| {
        row.push_bind(recipient.as_str())
            .push_bind(message)
            .push_bind(template_id)
            .push_bind(STATUS_QUEUED)
            .push_bind(sent_by)
            .push("UTC_TIMESTAMP()");
    });
    builder
}
