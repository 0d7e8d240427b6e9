use config::Config;
use session::SessionStore;
use sqlx::MySqlPool;
use std::sync::Arc;

pub mod common;
pub mod config;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod session;
pub mod sweep;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub pool: MySqlPool,
    pub config: Config,
    pub sessions: Arc<dyn SessionStore>,
}
