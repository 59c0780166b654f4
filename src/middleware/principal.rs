//! Authenticated principal as seen by the tenancy layer.
//!
//! Token validation happens upstream. Whatever authenticates the request inserts a
//! [`Principal`] into the request extensions; [`forwarded_principal`] covers deployments
//! where a gateway authenticates and forwards the identity as headers.

use crate::middleware::tenant::TenantResolver;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use uuid::Uuid;

pub const BUILDING_ID_HEADER: &str = "X-Building-Id";
pub const USER_ID_HEADER: &str = "X-User-Id";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Principal {
    pub subject: Option<Uuid>,
    pub claims: HashMap<String, String>,
}

impl Principal {
    pub fn new(subject: Option<Uuid>) -> Self {
        Principal {
            subject,
            claims: HashMap::new(),
        }
    }

    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    pub fn claim(&self, name: &str) -> Option<&str> {
        self.claims.get(name).map(String::as_str)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Build a principal from gateway headers. `claim_name` is the claim the building id
/// header is stored under. Returns `None` when neither header is present.
pub fn principal_from_headers(headers: &HeaderMap, claim_name: &str) -> Option<Principal> {
    let building = header(headers, BUILDING_ID_HEADER);
    let subject = header(headers, USER_ID_HEADER).and_then(|s| Uuid::parse_str(s).ok());
    if building.is_none() && subject.is_none() {
        return None;
    }
    let mut principal = Principal::new(subject);
    if let Some(b) = building {
        principal.claims.insert(claim_name.to_string(), b.to_string());
    }
    Some(principal)
}

/// Insert a [`Principal`] built from forwarded headers, unless one is already present.
/// The building id is stored under the resolver's claim name.
pub async fn forwarded_principal(
    State(resolver): State<TenantResolver>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.extensions().get::<Principal>().is_none() {
        if let Some(p) = principal_from_headers(request.headers(), resolver.claim()) {
            tracing::trace!(subject = ?p.subject, "principal from forwarded headers");
            request.extensions_mut().insert(p);
        }
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_forwarded_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(BUILDING_ID_HEADER, HeaderValue::from_static(" HN-GREENPARK "));
        headers.insert(
            USER_ID_HEADER,
            HeaderValue::from_static("6f1c1f7e-2b7a-4e47-9a65-3b8a6a1f0c11"),
        );
        let p = principal_from_headers(&headers, "building_id").unwrap();
        assert_eq!(p.claim("building_id"), Some("HN-GREENPARK"));
        assert!(p.subject.is_some());
    }

    #[test]
    fn no_headers_no_principal() {
        assert!(principal_from_headers(&HeaderMap::new(), "building_id").is_none());
    }
}
