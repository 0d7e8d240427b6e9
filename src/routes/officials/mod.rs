mod handler;
mod model;

use axum::{Router, routing::get};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handler::list_officials).post(handler::create_official),
        )
        .route(
            "/{id}",
            get(handler::get_official)
                .put(handler::update_official)
                .delete(handler::delete_official),
        )
}
