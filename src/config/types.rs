//! Runtime settings for tenant resolution, provisioning, and the sweep.

use std::path::PathBuf;
use std::time::Duration;

/// Schema used when a unit of work has not selected a tenant (no claim on the
/// principal, or a background job before its first tenant).
pub const DEFAULT_TENANT_SCHEMA: &str = "building";

/// Schema holding the building registry and other cross-tenant tables.
pub const DEFAULT_GLOBAL_SCHEMA: &str = "core";

/// Claim on the authenticated principal that names the tenant.
pub const DEFAULT_TENANT_CLAIM: &str = "building_id";

pub const DEFAULT_TEMPLATE_PATH: &str = "scripts/create_schema_template.sql";

#[derive(Clone, Debug)]
pub struct TenancyConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub default_schema: String,
    pub global_schema: String,
    pub tenant_claim: String,
    pub sweep_interval: Duration,
    /// Statement timeout applied to every provisioning batch.
    pub batch_timeout: Duration,
    /// Number of cached compiled models above which a capacity warning is logged.
    pub model_cache_warn_threshold: usize,
    pub template_path: PathBuf,
    /// Build the principal from gateway headers when no authentication layer set one.
    pub trust_forwarded_headers: bool,
    pub max_body_bytes: usize,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        TenancyConfig {
            database_url: "postgres://localhost/sams".into(),
            host: "0.0.0.0".into(),
            port: 8080,
            db_max_connections: 10,
            default_schema: DEFAULT_TENANT_SCHEMA.into(),
            global_schema: DEFAULT_GLOBAL_SCHEMA.into(),
            tenant_claim: DEFAULT_TENANT_CLAIM.into(),
            sweep_interval: Duration::from_secs(30),
            batch_timeout: Duration::from_secs(5 * 60),
            model_cache_warn_threshold: 256,
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            trust_forwarded_headers: false,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl TenancyConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
