mod handler;
mod model;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send", post(handler::send_sms))
        .route("/history", get(handler::sms_history))
}
