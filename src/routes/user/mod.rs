mod handler;
mod model;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub use model::User;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(handler::login))
        .route("/logout", post(handler::logout))
        .route("/me", get(handler::me))
}
