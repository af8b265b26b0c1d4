use crate::features::items::handlers::{self, ItemsState};
use axum::{
    routing::{get, put},
    Router,
};

/// Item routes (require bearer authentication)
pub fn protected_routes(state: ItemsState) -> Router {
    Router::new()
        .route(
            "/api/data",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route(
            "/api/data/{id}",
            put(handlers::update_item).delete(handlers::delete_item),
        )
        .with_state(state)
}
