//! Schema-per-building tenancy: tenant resolution, compiled model caching, schema
//! provisioning and the periodic tenant sweep.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod model_cache;
pub mod provision;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod sweep;
pub mod tenant;

pub use config::TenancyConfig;
pub use error::{AppError, ConfigError, SchemaNameError, ScriptExecutionError};
pub use middleware::{Principal, TenantResolver};
pub use model_cache::{ModelCache, ModelCacheKey, ModelCacheKeyFactory, TenantDbContext};
pub use provision::{split_batches, transform_script, ScriptRunner};
pub use routes::app_router;
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_global_tables};
pub use sweep::{SweepService, TenantDirectory, TenantEntry, TenantMaintenance, TickReport, MIN_SWEEP_INTERVAL};
pub use tenant::{validate, TenantContext, TenantSchema};
