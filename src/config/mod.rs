use std::env;
use std::time::Duration;

use sqlx::mysql::MySqlConnectOptions;

pub const SESSION_COOKIE_NAME: &str = "oscaims_sid";

const SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5 * 60;

/// Sweep period in seconds. Zero or garbage falls back to the default,
/// since a zero-length interval cannot be scheduled.
fn sweep_interval_secs(value: Option<String>) -> u64 {
    match value.as_deref().map(str::trim).map(str::parse::<u64>) {
        Some(Ok(secs)) if secs > 0 => secs,
        Some(_) => {
            tracing::warn!(
                "SESSION_SWEEP_INTERVAL_SECS must be a positive number of seconds, using {}",
                DEFAULT_SWEEP_INTERVAL_SECS
            );
            DEFAULT_SWEEP_INTERVAL_SECS
        }
        None => DEFAULT_SWEEP_INTERVAL_SECS,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn from_node_env(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub server_port: u16,
    pub frontend_url: String,
    pub session_secret: String,
    pub db_host: String,
    pub db_user: String,
    pub db_password: String,
    pub db_port: u16,
    pub db_database: String,
    pub db_max_connections: u32,
    pub environment: Environment,
    pub uploads_dir: String,
    pub sweep_interval_secs: u64,
    pub session_max_age_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            server_port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")?,
            session_secret: env::var("SESSION_SECRET")?,
            db_host: env::var("DB_HOST")?,
            db_user: env::var("DB_USER")?,
            db_password: env::var("DB_PASSWORD").unwrap_or_default(),
            db_port: env::var("DB_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3306),
            db_database: env::var("DB_DATABASE")?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            environment: Environment::from_node_env(env::var("NODE_ENV").ok()),
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".into()),
            sweep_interval_secs: sweep_interval_secs(env::var("SESSION_SWEEP_INTERVAL_SECS").ok()),
            session_max_age_secs: SESSION_MAX_AGE_SECS,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn database_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .password(&self.db_password)
            .database(&self.db_database)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_env_production_is_recognised() {
        assert_eq!(
            Environment::from_node_env(Some("production".into())),
            Environment::Production
        );
    }

    #[test]
    fn anything_else_is_development() {
        assert_eq!(Environment::from_node_env(None), Environment::Development);
        assert_eq!(
            Environment::from_node_env(Some("staging".into())),
            Environment::Development
        );
    }

    #[test]
    fn sweep_interval_defaults_to_five_minutes() {
        assert_eq!(sweep_interval_secs(None), 300);
        assert_eq!(sweep_interval_secs(Some("60".into())), 60);
    }

    #[test]
    fn zero_or_garbage_sweep_interval_falls_back() {
        assert_eq!(sweep_interval_secs(Some("0".into())), 300);
        assert_eq!(sweep_interval_secs(Some("-5".into())), 300);
        assert_eq!(sweep_interval_secs(Some("soon".into())), 300);
    }
}
