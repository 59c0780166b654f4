//! Announcements of the request's tenant.

use crate::error::AppError;
use crate::extractors::Tenant;
use crate::response::{success_many, success_one_ok};
use crate::state::AppState;
use axum::extract::State;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpireResult {
    pub schema: String,
    pub affected: u64,
}

pub async fn list(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(success_many(state.announcements.list_active(&ctx).await?))
}

/// Run the window transitions now for the current tenant only.
pub async fn expire(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let affected = state.announcements.expire_due(&ctx).await?;
    tracing::info!(schema = %ctx.get(), affected, "announcement expiry run on request");
    Ok(success_one_ok(ExpireResult {
        schema: ctx.schema_name().to_string(),
        affected,
    }))
}
