//! Router assembly.

mod buildings;
mod common;
mod tenant;

pub use buildings::building_routes;
pub use common::common_routes;
pub use tenant::tenant_routes;

use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

/// The full API. Request tracing is layered by the binary.
pub fn app_router(state: AppState) -> Router {
    let limit = state.config.max_body_bytes;
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api/core/buildings", building_routes(state.clone()))
        .merge(tenant_routes(state))
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(limit)))
}
