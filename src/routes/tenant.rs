//! Tenant-scoped routes. Every route here runs behind the tenant middleware.

use crate::handlers::{announcements, tenant};
use crate::middleware::{forwarded_principal, resolve_tenant};
use crate::state::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

pub fn tenant_routes(state: AppState) -> Router {
    let resolver = state.tenants.clone();
    let trust_forwarded = state.config.trust_forwarded_headers;

    let router = Router::new()
        .route("/api/tenant/context", get(tenant::current))
        .route("/api/announcements", get(announcements::list))
        .route("/api/announcements/expire", post(announcements::expire))
        .with_state(state)
        .route_layer(from_fn_with_state(resolver.clone(), resolve_tenant));

    if trust_forwarded {
        router.route_layer(from_fn_with_state(resolver, forwarded_principal))
    } else {
        router
    }
}
