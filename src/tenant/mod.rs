//! Tenant identity: validated schema names, the per-unit-of-work context, and the
//! global building registry that maps tenants to schemas.

pub mod context;
pub mod registry;
pub mod schema;

pub use context::TenantContext;
pub use registry::{Building, BuildingRegistry, BuildingSummary, NewBuilding};
pub use schema::{validate, TenantSchema};
