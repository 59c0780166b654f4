use crate::extractors::Tenant;
use crate::response::success_one_ok;
use crate::state::AppState;
use crate::tenant::registry::Building;
use axum::extract::State;
use serde::Serialize;

#[derive(Serialize)]
pub struct TenantBody {
    pub schema: String,
    /// Registry row for the schema; `None` for the fallback schema or when the
    /// registry cannot be read.
    pub building: Option<Building>,
}

/// GET /api/tenant/context: the schema selected for this request and its building.
pub async fn current(State(state): State<AppState>, Tenant(ctx): Tenant) -> impl axum::response::IntoResponse {
    let building = match state.registry.get_by_schema(ctx.schema_name()).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(schema = %ctx.get(), error = %e, "building lookup failed");
            None
        }
    };
    success_one_ok(TenantBody {
        schema: ctx.schema_name().to_string(),
        building,
    })
}
