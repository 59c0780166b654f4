//! Request middleware: principal forwarding and tenant resolution.

pub mod principal;
pub mod tenant;

pub use principal::{forwarded_principal, Principal, BUILDING_ID_HEADER, USER_ID_HEADER};
pub use tenant::{resolve_tenant, TenantResolver, INVALID_TENANT_BODY};
