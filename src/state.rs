//! Shared application state for all routes.

use crate::config::TenancyConfig;
use crate::error::ConfigError;
use crate::middleware::TenantResolver;
use crate::model_cache::ModelCache;
use crate::provision::ScriptRunner;
use crate::service::{AnnouncementExpiry, AnnouncementService, BuildingService};
use crate::sweep::SweepService;
use crate::tenant::{BuildingRegistry, TenantSchema};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<TenancyConfig>,
    /// Compiled per-tenant models; shared by requests and the sweep.
    pub models: Arc<ModelCache>,
    pub tenants: TenantResolver,
    pub registry: BuildingRegistry,
    pub buildings: BuildingService,
    pub announcements: AnnouncementService,
}

fn schema_setting(key: &'static str, value: &str) -> Result<TenantSchema, ConfigError> {
    TenantSchema::parse(value).map_err(|e| ConfigError::InvalidValue {
        key,
        message: e.to_string(),
    })
}

impl AppState {
    pub fn new(pool: PgPool, config: TenancyConfig) -> Result<Self, ConfigError> {
        let fallback = schema_setting("TENANCY_DEFAULT_SCHEMA", &config.default_schema)?;
        let global = schema_setting("TENANCY_GLOBAL_SCHEMA", &config.global_schema)?;

        let models = Arc::new(ModelCache::new(config.model_cache_warn_threshold));
        let registry = BuildingRegistry::new(pool.clone(), global.as_str());
        let runner = ScriptRunner::new(pool.clone(), config.batch_timeout);
        let buildings = BuildingService::new(registry.clone(), runner, config.template_path.clone());
        let announcements = AnnouncementService::new(pool.clone(), models.clone());

        Ok(AppState {
            pool,
            tenants: TenantResolver::new(fallback, config.tenant_claim.as_str()),
            config: Arc::new(config),
            models,
            registry,
            buildings,
            announcements,
        })
    }

    /// Announcement expiry over every active building, on the configured interval.
    pub fn sweep(&self) -> SweepService {
        SweepService::new(
            Arc::new(self.registry.clone()),
            Arc::new(AnnouncementExpiry::new(self.announcements.clone())),
            self.tenants.fallback().clone(),
            self.config.sweep_interval,
        )
    }
}
