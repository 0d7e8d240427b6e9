use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

use crate::error::AppError;
use crate::utils::{optional_phone, optional_text, required_text};

/// Registry eligibility starts at this age.
pub const MINIMUM_AGE: i32 = 60;

const STATUSES: [&str; 3] = ["active", "inactive", "deceased"];

#[derive(Debug, Serialize, FromRow)]
pub struct SeniorCitizen {
    pub id: i64,
    pub osca_id: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub birthdate: NaiveDate,
    pub gender: String,
    pub address: String,
    pub barangay: String,
    pub contact_number: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SeniorCitizenRequest {
    pub osca_id: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub birthdate: NaiveDate,
    pub gender: String,
    pub address: String,
    pub barangay: String,
    pub contact_number: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct ValidSeniorCitizen {
    pub osca_id: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub birthdate: NaiveDate,
    pub gender: String,
    pub address: String,
    pub barangay: String,
    pub contact_number: Option<String>,
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub barangay: Option<String>,
    pub status: Option<String>,
}

pub fn age_on(birthdate: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birthdate.year();
    if (today.month(), today.day()) < (birthdate.month(), birthdate.day()) {
        age -= 1;
    }
    age
}

impl SeniorCitizenRequest {
    pub fn validate(self, today: NaiveDate) -> Result<ValidSeniorCitizen, AppError> {
        if self.birthdate > today {
            return Err(AppError::Validation("birthdate is in the future".into()));
        }
        if age_on(self.birthdate, today) < MINIMUM_AGE {
            return Err(AppError::Validation(format!(
                "registrant must be at least {MINIMUM_AGE} years old"
            )));
        }

        let gender = required_text("gender", &self.gender, 10)?.to_lowercase();
        if gender != "male" && gender != "female" {
            return Err(AppError::Validation("gender must be male or female".into()));
        }

        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => "active".to_string(),
            Some(s) if STATUSES.contains(&s) => s.to_string(),
            Some(s) => return Err(AppError::Validation(format!("unknown status {s}"))),
        };

        let contact_number = optional_phone("contact_number", self.contact_number.as_deref())?;

        Ok(ValidSeniorCitizen {
            osca_id: optional_text("osca_id", self.osca_id.as_deref(), 50)?,
            first_name: required_text("first_name", &self.first_name, 100)?,
            middle_name: optional_text("middle_name", self.middle_name.as_deref(), 100)?,
            last_name: required_text("last_name", &self.last_name, 100)?,
            birthdate: self.birthdate,
            gender,
            address: required_text("address", &self.address, 255)?,
            barangay: required_text("barangay", &self.barangay, 100)?,
            contact_number,
            status,
        })
    }
}

const COLUMNS: &str = "id, osca_id, first_name, middle_name, last_name, birthdate, gender, \
     address, barangay, contact_number, status, created_at, updated_at";

fn push_filters(builder: &mut QueryBuilder<'_, MySql>, search: &SearchQuery) {
    builder.push(" WHERE 1 = 1");
    if let Some(q) = search.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{q}%");
        builder
            .push(" AND (first_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR osca_id LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(barangay) = search.barangay.as_deref().filter(|b| !b.is_empty()) {
        builder.push(" AND barangay = ").push_bind(barangay.to_string());
    }
    if let Some(status) = search.status.as_deref().filter(|s| !s.is_empty()) {
        builder.push(" AND status = ").push_bind(status.to_string());
    }
}

impl SeniorCitizen {
    pub async fn search(
        pool: &MySqlPool,
        search: &SearchQuery,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut builder = QueryBuilder::<MySql>::new(format!("SELECT {COLUMNS} FROM senior_citizens"));
        push_filters(&mut builder, search);
        builder
            .push(" ORDER BY last_name, first_name LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        builder.build_query_as::<SeniorCitizen>().fetch_all(pool).await
    }

    pub async fn count(pool: &MySqlPool, search: &SearchQuery) -> Result<i64, sqlx::Error> {
        let mut builder = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM senior_citizens");
        push_filters(&mut builder, search);
        builder.build_query_scalar::<i64>().fetch_one(pool).await
    }

    pub async fn find_by_id(pool: &MySqlPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, SeniorCitizen>(&format!(
            "SELECT {COLUMNS} FROM senior_citizens WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &MySqlPool, req: &ValidSeniorCitizen) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO senior_citizens
                (osca_id, first_name, middle_name, last_name, birthdate, gender, address,
                 barangay, contact_number, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, UTC_TIMESTAMP(), UTC_TIMESTAMP())
            "#,
        )
        .bind(&req.osca_id)
        .bind(&req.first_name)
        .bind(&req.middle_name)
        .bind(&req.last_name)
        .bind(req.birthdate)
        .bind(&req.gender)
        .bind(&req.address)
        .bind(&req.barangay)
        .bind(&req.contact_number)
        .bind(&req.status)
        .execute(pool)
        .await?;

        Ok(result.last_insert_id() as i64)
    }

    pub async fn update(pool: &MySqlPool, id: i64, req: &ValidSeniorCitizen) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE senior_citizens
            SET osca_id = ?, first_name = ?, middle_name = ?, last_name = ?, birthdate = ?,
                gender = ?, address = ?, barangay = ?, contact_number = ?, status = ?,
                updated_at = UTC_TIMESTAMP()
            WHERE id = ?
            "#,
        )
        .bind(&req.osca_id)
        .bind(&req.first_name)
        .bind(&req.middle_name)
        .bind(&req.last_name)
        .bind(req.birthdate)
        .bind(&req.gender)
        .bind(&req.address)
        .bind(&req.barangay)
        .bind(&req.contact_number)
        .bind(&req.status)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn delete(pool: &MySqlPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM senior_citizens WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub fn full_name(&self) -> String {
        match &self.middle_name {
            Some(middle) => format!("{} {} {}", self.first_name, middle, self.last_name),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn request(birthdate: NaiveDate) -> SeniorCitizenRequest {
        SeniorCitizenRequest {
            osca_id: Some("OSCA-0001".into()),
            first_name: "Jose".into(),
            middle_name: None,
            last_name: "Rizal".into(),
            birthdate,
            gender: "Male".into(),
            address: "12 Mabini St".into(),
            barangay: "Poblacion".into(),
            contact_number: Some("09171234567".into()),
            status: None,
        }
    }

    #[test]
    fn age_counts_completed_years() {
        let birth = NaiveDate::from_ymd_opt(1965, 6, 16).unwrap();
        assert_eq!(age_on(birth, today()), 59);
        let birth = NaiveDate::from_ymd_opt(1965, 6, 15).unwrap();
        assert_eq!(age_on(birth, today()), 60);
    }

    #[test]
    fn valid_request_is_normalised() {
        let valid = request(NaiveDate::from_ymd_opt(1950, 1, 1).unwrap())
            .validate(today())
            .unwrap();
        assert_eq!(valid.gender, "male");
        assert_eq!(valid.status, "active");
    }

    #[test]
    fn under_age_registrant_is_rejected() {
        let req = request(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
        assert!(matches!(req.validate(today()), Err(AppError::Validation(_))));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut req = request(NaiveDate::from_ymd_opt(1950, 1, 1).unwrap());
        req.status = Some("retired".into());
        assert!(req.validate(today()).is_err());
    }

    #[test]
    fn search_filters_are_bound() {
        let search = SearchQuery {
            q: Some("rizal".into()),
            barangay: Some("Poblacion".into()),
            status: None,
        };
        let mut builder = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM senior_citizens");
        push_filters(&mut builder, &search);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM senior_citizens WHERE 1 = 1 AND (first_name LIKE ? \
             OR last_name LIKE ? OR osca_id LIKE ?) AND barangay = ?"
        );
    }
}
