mod handler;
mod model;

use axum::{Router, routing::get};

use crate::AppState;

pub use model::{AuditEntry, AuditLog};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(handler::list_audit_logs))
}
