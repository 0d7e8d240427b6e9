mod handler;
mod model;

use axum::{Router, routing::get};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handler::list_senior_citizens).post(handler::create_senior_citizen),
        )
        .route(
            "/{id}",
            get(handler::get_senior_citizen)
                .put(handler::update_senior_citizen)
                .delete(handler::delete_senior_citizen),
        )
}
