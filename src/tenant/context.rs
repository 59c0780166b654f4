//! Per-unit-of-work tenant selection.
//!
//! A `TenantContext` is owned by exactly one request or one sweep iteration and is
//! passed explicitly to every tenant-scoped call. It is never stored in shared state.

use crate::tenant::schema::TenantSchema;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TenantContext {
    schema: TenantSchema,
}

impl TenantContext {
    /// Start a unit of work on the fallback schema.
    pub fn new(fallback: TenantSchema) -> Self {
        TenantContext { schema: fallback }
    }

    pub fn get(&self) -> &TenantSchema {
        &self.schema
    }

    /// Select the tenant for this unit of work. Last write wins.
    pub fn set(&mut self, schema: TenantSchema) {
        self.schema = schema;
    }

    pub fn schema_name(&self) -> &str {
        self.schema.as_str()
    }
}
