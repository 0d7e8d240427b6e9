mod handler;
mod model;

use axum::{Router, routing::get};

use crate::AppState;

pub use model::{MAX_CONTENT_CHARS, Template};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handler::list_templates).post(handler::create_template),
        )
        .route(
            "/{id}",
            get(handler::get_template)
                .put(handler::update_template)
                .delete(handler::delete_template),
        )
}
