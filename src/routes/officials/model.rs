use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySqlPool};

use crate::error::AppError;
use crate::utils::{optional_phone, optional_text, required_text};

#[derive(Debug, Serialize, FromRow)]
pub struct Official {
    pub id: i64,
    pub name: String,
    pub position: String,
    pub contact_number: Option<String>,
    pub term_start: Option<NaiveDate>,
    pub term_end: Option<NaiveDate>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct OfficialRequest {
    pub name: String,
    pub position: String,
    pub contact_number: Option<String>,
    pub term_start: Option<NaiveDate>,
    pub term_end: Option<NaiveDate>,
    /// Path of an already uploaded image under `/uploads`.
    pub photo_url: Option<String>,
}

/// An [`OfficialRequest`] after trimming and checks.
#[derive(Debug, PartialEq)]
pub struct ValidOfficial {
    pub name: String,
    pub position: String,
    pub contact_number: Option<String>,
    pub term_start: Option<NaiveDate>,
    pub term_end: Option<NaiveDate>,
    pub photo_url: Option<String>,
}

impl OfficialRequest {
    pub fn validate(self) -> Result<ValidOfficial, AppError> {
        if let (Some(start), Some(end)) = (self.term_start, self.term_end) {
            if end < start {
                return Err(AppError::Validation(
                    "term_end must not be before term_start".into(),
                ));
            }
        }

        Ok(ValidOfficial {
            name: required_text("name", &self.name, 150)?,
            position: required_text("position", &self.position, 100)?,
            contact_number: optional_phone("contact_number", self.contact_number.as_deref())?,
            term_start: self.term_start,
            term_end: self.term_end,
            photo_url: optional_text("photo_url", self.photo_url.as_deref(), 255)?,
        })
    }
}

const COLUMNS: &str =
    "id, name, position, contact_number, term_start, term_end, photo_url, created_at, updated_at";

impl Official {
    pub async fn list(pool: &MySqlPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Official>(&format!(
            "SELECT {COLUMNS} FROM officials ORDER BY position, name"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &MySqlPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Official>(&format!("SELECT {COLUMNS} FROM officials WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &MySqlPool, req: &ValidOfficial) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO officials
                (name, position, contact_number, term_start, term_end, photo_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, UTC_TIMESTAMP(), UTC_TIMESTAMP())
            "#,
        )
        .bind(&req.name)
        .bind(&req.position)
        .bind(&req.contact_number)
        .bind(req.term_start)
        .bind(req.term_end)
        .bind(&req.photo_url)
        .execute(pool)
        .await?;

        Ok(result.last_insert_id() as i64)
    }

    pub async fn update(pool: &MySqlPool, id: i64, req: &ValidOfficial) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE officials
            SET name = ?, position = ?, contact_number = ?, term_start = ?, term_end = ?,
                photo_url = ?, updated_at = UTC_TIMESTAMP()
            WHERE id = ?
            "#,
        )
        .bind(&req.name)
        .bind(&req.position)
        .bind(&req.contact_number)
        .bind(req.term_start)
        .bind(req.term_end)
        .bind(&req.photo_url)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn delete(pool: &MySqlPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM officials WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
