//! Extract the tenant context placed by the tenant middleware.

use crate::error::AppError;
use crate::tenant::TenantContext;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

/// The request's [`TenantContext`]. Rejects with 500 when the route is not behind
/// [`resolve_tenant`](crate::middleware::resolve_tenant).
#[derive(Clone, Debug)]
pub struct Tenant(pub TenantContext);

#[async_trait]
impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .map(Tenant)
            .ok_or_else(|| AppError::Internal("tenant context missing".into()))
    }
}
