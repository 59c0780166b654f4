//! Global (non-tenant) building registry: maps a building code to its physical schema.

use crate::error::AppError;
use crate::sql::qualified;
use crate::sweep::{TenantDirectory, TenantEntry};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

pub const BUILDING_TABLE: &str = "building";

pub const STATUS_INACTIVE: i16 = 0;
pub const STATUS_ACTIVE: i16 = 1;

const BUILDING_COLUMNS: &str = "id, code, schema_name, building_name, status, description, total_area_m2, \
     opening_date, latitude, longitude, image_url, is_deleted, deleted_at, created_by, updated_by, \
     created_at, updated_at";

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: Uuid,
    pub code: String,
    pub schema_name: String,
    pub building_name: String,
    pub status: i16,
    pub description: Option<String>,
    pub total_area_m2: Option<f64>,
    pub opening_date: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub image_url: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Row shape for dropdowns and for the sweep's tenant listing.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BuildingSummary {
    pub id: Uuid,
    pub building_name: String,
    pub schema_name: String,
}

/// Insert payload, assembled by the onboarding service after provisioning succeeds.
#[derive(Clone, Debug)]
pub struct NewBuilding {
    pub code: String,
    pub schema_name: String,
    pub building_name: String,
    pub description: Option<String>,
    pub total_area_m2: Option<f64>,
    pub opening_date: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub image_url: Option<String>,
    pub created_by: Option<Uuid>,
}

#[derive(Clone)]
pub struct BuildingRegistry {
    pool: PgPool,
    table: String,
}

impl BuildingRegistry {
    pub fn new(pool: PgPool, global_schema: &str) -> Self {
        BuildingRegistry {
            pool,
            table: qualified(global_schema, BUILDING_TABLE),
        }
    }

    /// Active, non-deleted buildings ordered by name.
    pub async fn list_active(&self) -> Result<Vec<Building>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE status = $1 AND NOT is_deleted ORDER BY building_name",
            BUILDING_COLUMNS, self.table
        );
        tracing::debug!(sql = %sql, "query");
        Ok(sqlx::query_as::<_, Building>(&sql)
            .bind(STATUS_ACTIVE)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Every building including inactive ones.
    pub async fn list_all(&self) -> Result<Vec<Building>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE NOT is_deleted ORDER BY building_name",
            BUILDING_COLUMNS, self.table
        );
        tracing::debug!(sql = %sql, "query");
        Ok(sqlx::query_as::<_, Building>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn dropdown(&self) -> Result<Vec<BuildingSummary>, AppError> {
        let sql = format!(
            "SELECT id, building_name, schema_name FROM {} WHERE status = $1 AND NOT is_deleted ORDER BY building_name",
            self.table
        );
        Ok(sqlx::query_as::<_, BuildingSummary>(&sql)
            .bind(STATUS_ACTIVE)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Building>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", BUILDING_COLUMNS, self.table);
        Ok(sqlx::query_as::<_, Building>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_by_schema(&self, schema_name: &str) -> Result<Option<Building>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE schema_name = $1", BUILDING_COLUMNS, self.table);
        Ok(sqlx::query_as::<_, Building>(&sql)
            .bind(schema_name)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE code = $1)", self.table);
        let row: (bool,) = sqlx::query_as(&sql).bind(code).fetch_one(&self.pool).await?;
        Ok(row.0)
    }

    pub async fn schema_exists(&self, schema_name: &str) -> Result<bool, AppError> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE schema_name = $1)", self.table);
        let row: (bool,) = sqlx::query_as(&sql)
            .bind(schema_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn insert(&self, b: &NewBuilding) -> Result<Building, AppError> {
        let sql = format!(
            "INSERT INTO {} (id, code, schema_name, building_name, status, description, total_area_m2, \
             opening_date, latitude, longitude, image_url, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW()) RETURNING {}",
            self.table, BUILDING_COLUMNS
        );
        let row = sqlx::query_as::<_, Building>(&sql)
            .bind(Uuid::new_v4())
            .bind(&b.code)
            .bind(&b.schema_name)
            .bind(&b.building_name)
            .bind(STATUS_ACTIVE)
            .bind(&b.description)
            .bind(b.total_area_m2)
            .bind(b.opening_date)
            .bind(b.latitude)
            .bind(b.longitude)
            .bind(&b.image_url)
            .bind(b.created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db) = &e {
                    if db.is_unique_violation() {
                        return AppError::Conflict(format!("building code or schema already exists: {}", b.code));
                    }
                }
                AppError::Db(e)
            })?;
        Ok(row)
    }

    /// Persist mutable fields of an existing building. `updated_at` is set by the database.
    pub async fn update(&self, b: &Building) -> Result<Building, AppError> {
        let sql = format!(
            "UPDATE {} SET building_name = $2, status = $3, description = $4, total_area_m2 = $5, \
             opening_date = $6, latitude = $7, longitude = $8, image_url = $9, updated_by = $10, \
             updated_at = NOW() WHERE id = $1 RETURNING {}",
            self.table, BUILDING_COLUMNS
        );
        let row = sqlx::query_as::<_, Building>(&sql)
            .bind(b.id)
            .bind(&b.building_name)
            .bind(b.status)
            .bind(&b.description)
            .bind(b.total_area_m2)
            .bind(b.opening_date)
            .bind(b.latitude)
            .bind(b.longitude)
            .bind(&b.image_url)
            .bind(b.updated_by)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or_else(|| AppError::NotFound(format!("building {}", b.id)))
    }
}

#[async_trait]
impl TenantDirectory for BuildingRegistry {
    async fn list_tenants(&self) -> Result<Vec<TenantEntry>, AppError> {
        Ok(self
            .dropdown()
            .await?
            .into_iter()
            .map(|b| TenantEntry {
                name: b.building_name,
                schema_name: b.schema_name,
            })
            .collect())
    }
}
