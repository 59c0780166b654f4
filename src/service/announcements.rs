//! Tenant announcements: listing and the status transitions driven by the visibility window.

use crate::error::AppError;
use crate::model_cache::{ModelCache, TenantDbContext};
use crate::sql::tenant_table;
use crate::sweep::TenantMaintenance;
use crate::tenant::{TenantContext, TenantSchema};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub const ANNOUNCEMENT_TABLE: &str = "announcements";

pub const STATUS_SCHEDULED: &str = "SCHEDULED";
pub const STATUS_ACTIVE: &str = "ACTIVE";
pub const STATUS_EXPIRED: &str = "EXPIRED";
pub const STATUS_INACTIVE: &str = "INACTIVE";

/// Only these types (or no type) follow the visibility window.
const WINDOWED_TYPES: &str = "(type IS NULL OR type IN ('ANNOUNCEMENT', 'EVENT'))";

const ANNOUNCEMENT_COLUMNS: &str = "announcement_id, title, content, visible_from, visible_to, visibility_scope, \
     status, is_pinned, type, created_at, created_by, updated_at, updated_by, schedule_id, booking_id";

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub announcement_id: Uuid,
    pub title: String,
    pub content: String,
    pub visible_from: DateTime<Utc>,
    pub visible_to: Option<DateTime<Utc>>,
    pub visibility_scope: Option<String>,
    pub status: String,
    pub is_pinned: bool,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    pub schedule_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
}

/// Announcement SQL compiled for one tenant schema.
#[derive(Debug)]
pub struct AnnouncementModel {
    pub schema: TenantSchema,
    pub table: String,
    pub list_active_sql: String,
    /// `SCHEDULED -> ACTIVE` once `visible_from` has passed. `$1` is now.
    pub activate_scheduled_sql: String,
    /// `ACTIVE -> EXPIRED` once `visible_to` has passed. `$1` is now.
    pub expire_active_sql: String,
    /// Any other status inside its window becomes `ACTIVE`. `$1` is now.
    pub activate_in_window_sql: String,
}

impl AnnouncementModel {
    fn expiry_statements(&self) -> [&str; 3] {
        [
            self.activate_scheduled_sql.as_str(),
            self.expire_active_sql.as_str(),
            self.activate_in_window_sql.as_str(),
        ]
    }
}

/// Data-access context for announcements of the tenant selected in `tenant`.
pub struct AnnouncementContext {
    tenant: TenantContext,
}

impl AnnouncementContext {
    pub fn new(tenant: &TenantContext) -> Self {
        AnnouncementContext {
            tenant: tenant.clone(),
        }
    }
}

impl TenantDbContext for AnnouncementContext {
    type Model = AnnouncementModel;

    fn tenant(&self) -> &TenantContext {
        &self.tenant
    }

    fn build_model(schema: &TenantSchema, _design_time: bool) -> AnnouncementModel {
        let table = tenant_table(schema, ANNOUNCEMENT_TABLE);
        AnnouncementModel {
            schema: schema.clone(),
            list_active_sql: format!(
                "SELECT {} FROM {} WHERE status = '{}' ORDER BY is_pinned DESC, visible_from DESC",
                ANNOUNCEMENT_COLUMNS, table, STATUS_ACTIVE
            ),
            activate_scheduled_sql: format!(
                "UPDATE {} SET status = '{}', updated_at = $1 \
                 WHERE status = '{}' AND visible_from <= $1 AND {}",
                table, STATUS_ACTIVE, STATUS_SCHEDULED, WINDOWED_TYPES
            ),
            expire_active_sql: format!(
                "UPDATE {} SET status = '{}', updated_at = $1 \
                 WHERE status = '{}' AND visible_to IS NOT NULL AND visible_to < $1 AND {}",
                table, STATUS_EXPIRED, STATUS_ACTIVE, WINDOWED_TYPES
            ),
            activate_in_window_sql: format!(
                "UPDATE {} SET status = '{}', updated_at = $1 \
                 WHERE status NOT IN ('{}', '{}', '{}') AND visible_from <= $1 \
                 AND (visible_to IS NULL OR visible_to >= $1) AND {}",
                table, STATUS_ACTIVE, STATUS_INACTIVE, STATUS_ACTIVE, STATUS_EXPIRED, WINDOWED_TYPES
            ),
            table,
        }
    }
}

#[derive(Clone)]
pub struct AnnouncementService {
    pool: PgPool,
    models: Arc<ModelCache>,
}

impl AnnouncementService {
    pub fn new(pool: PgPool, models: Arc<ModelCache>) -> Self {
        AnnouncementService { pool, models }
    }

    fn model(&self, tenant: &TenantContext) -> Arc<AnnouncementModel> {
        self.models.get_or_build(&AnnouncementContext::new(tenant), false)
    }

    pub async fn list_active(&self, tenant: &TenantContext) -> Result<Vec<Announcement>, AppError> {
        let model = self.model(tenant);
        Ok(sqlx::query_as::<_, Announcement>(&model.list_active_sql)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Apply the window transitions for the tenant in `tenant`, in order, on one
    /// transaction. Returns the total number of rows updated.
    pub async fn expire_due(&self, tenant: &TenantContext) -> Result<u64, AppError> {
        self.expire_due_at(tenant, Utc::now()).await
    }

    pub async fn expire_due_at(&self, tenant: &TenantContext, now: DateTime<Utc>) -> Result<u64, AppError> {
        let model = self.model(tenant);
        let mut tx = self.pool.begin().await?;
        let mut affected = 0u64;
        for sql in model.expiry_statements() {
            affected += sqlx::query(sql).bind(now).execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }
}

/// Sweep job: announcement window transitions for every tenant.
pub struct AnnouncementExpiry {
    service: AnnouncementService,
}

impl AnnouncementExpiry {
    pub fn new(service: AnnouncementService) -> Self {
        AnnouncementExpiry { service }
    }
}

#[async_trait]
impl TenantMaintenance for AnnouncementExpiry {
    async fn run(&self, ctx: &TenantContext) -> Result<u64, AppError> {
        self.service.expire_due(ctx).await
    }
}
