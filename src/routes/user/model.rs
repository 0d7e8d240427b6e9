use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

use crate::error::AppError;
use crate::utils::verify_password;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_INACTIVE: &str = "inactive";

#[derive(Debug, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::Validation(
                "username and password are required".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: i64,
    pub username: String,
    pub role: String,
}

impl User {
    pub async fn find_by_username(
        pool: &MySqlPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, role, status, last_login
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    pub fn verify_login(&self, password: &str) -> Result<bool, bcrypt::BcryptError> {
        verify_password(password, &self.password_hash)
    }

    pub async fn mark_logged_in(pool: &MySqlPool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET status = ?, last_login = UTC_TIMESTAMP() WHERE id = ?")
            .bind(STATUS_ACTIVE)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_status(pool: &MySqlPool, id: i64, status: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// `UPDATE users SET status = 'inactive' WHERE id IN (...)` in one
    /// statement. Returns the number of rows changed.
    pub async fn deactivate_many(pool: &MySqlPool, ids: &[i64]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut builder = deactivate_query(ids);
        let result = builder.build().execute(pool).await?;
        Ok(result.rows_affected())
    }
}

fn deactivate_query(ids: &[i64]) -> QueryBuilder<'static, MySql> {
    let mut builder = QueryBuilder::<MySql>::new("UPDATE users SET status = ");
    builder.push_bind(STATUS_INACTIVE);
    builder.push(" WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
    builder
}
