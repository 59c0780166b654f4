//! Global building registry routes, mounted at `/api/core/buildings`.

use crate::handlers::buildings::{create, dropdown, list_active, list_all, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn building_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_active).post(create))
        .route("/all", get(list_all))
        .route("/dropdown", get(dropdown))
        .route("/:id", get(read).put(update))
        .with_state(state)
}
