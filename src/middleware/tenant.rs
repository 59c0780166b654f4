//! Select the tenant schema for each request from the principal's building claim.

use crate::error::SchemaNameError;
use crate::middleware::principal::Principal;
use crate::tenant::{TenantContext, TenantSchema};
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Fixed body of the rejection sent for an unusable claim.
pub const INVALID_TENANT_BODY: &str = "Invalid building_id";

#[derive(Clone, Debug)]
pub struct TenantResolver {
    fallback: TenantSchema,
    claim: Arc<str>,
}

impl TenantResolver {
    pub fn new(fallback: TenantSchema, claim: impl Into<Arc<str>>) -> Self {
        TenantResolver {
            fallback,
            claim: claim.into(),
        }
    }

    pub fn fallback(&self) -> &TenantSchema {
        &self.fallback
    }

    pub fn claim(&self) -> &str {
        &self.claim
    }

    /// Context for a request carrying `principal`. No principal or no claim selects the
    /// fallback schema; a claim that fails validation is an error.
    pub fn resolve(&self, principal: Option<&Principal>) -> Result<TenantContext, SchemaNameError> {
        let mut ctx = TenantContext::new(self.fallback.clone());
        if let Some(value) = principal.and_then(|p| p.claim(&self.claim)) {
            ctx.set(TenantSchema::from_claim(value)?);
        }
        Ok(ctx)
    }
}

/// Runs after authentication. Rejects with `400 Invalid building_id` without calling the
/// handler when the claim is not a usable schema name.
pub async fn resolve_tenant(
    State(resolver): State<TenantResolver>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = resolver.resolve(request.extensions().get::<Principal>());
    match resolved {
        Ok(ctx) => {
            tracing::debug!(schema = %ctx.get(), "tenant resolved");
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(claim = %resolver.claim, error = %e, "rejecting request with invalid tenant claim");
            (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                INVALID_TENANT_BODY,
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> TenantResolver {
        TenantResolver::new(TenantSchema::parse("building").unwrap(), "building_id")
    }

    #[test]
    fn claim_selects_schema() {
        let p = Principal::default().with_claim("building_id", "HN-GREENPARK");
        let ctx = resolver().resolve(Some(&p)).unwrap();
        assert_eq!(ctx.schema_name(), "HN-GREENPARK");
    }

    #[test]
    fn missing_claim_uses_fallback() {
        assert_eq!(resolver().resolve(None).unwrap().schema_name(), "building");
        let p = Principal::default().with_claim("role", "admin");
        assert_eq!(resolver().resolve(Some(&p)).unwrap().schema_name(), "building");
    }

    #[test]
    fn bad_claim_is_rejected() {
        let p = Principal::default().with_claim("building_id", "bad id!");
        assert_eq!(
            resolver().resolve(Some(&p)),
            Err(SchemaNameError::Invalid("bad id!".to_string()))
        );
        let p = Principal::default().with_claim("building_id", "");
        assert_eq!(resolver().resolve(Some(&p)), Err(SchemaNameError::Empty));
    }

    #[test]
    fn claim_name_is_configurable() {
        let r = TenantResolver::new(TenantSchema::parse("building").unwrap(), "tenant");
        let p = Principal::default().with_claim("tenant", "t_9");
        assert_eq!(r.resolve(Some(&p)).unwrap().schema_name(), "t_9");
    }
}
