//! Building onboarding: validate, provision the tenant schema, register the building.

use crate::error::{AppError, ConfigError, SchemaNameError};
use crate::provision::{split_batches, transform_script, ScriptRunner};
use crate::service::validation;
use crate::tenant::registry::{Building, BuildingRegistry, NewBuilding, STATUS_ACTIVE, STATUS_INACTIVE};
use crate::tenant::TenantSchema;
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

pub const CODE_MAX_LEN: usize = 30;
pub const NAME_MAX_LEN: usize = 150;

/// Prefix for schemas derived from codes that start with a digit.
const DIGIT_PREFIX: &str = "b_";

fn code_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static pattern"))
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuildingRequest {
    pub code: Option<String>,
    pub building_name: Option<String>,
    pub description: Option<String>,
    pub total_area_m2: Option<f64>,
    pub opening_date: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub image_url: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBuildingRequest {
    pub building_name: Option<String>,
    pub description: Option<String>,
    pub total_area_m2: Option<f64>,
    pub opening_date: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub image_url: Option<String>,
    pub status: Option<i16>,
}

/// Derive the tenant schema name from a building code: trim, lowercase, `-` to `_`, drop
/// anything else outside `[a-z0-9_]`. Codes starting with a digit get a `b_` prefix.
pub fn schema_from_code(code: &str) -> Result<TenantSchema, SchemaNameError> {
    let lowered = code.trim().to_lowercase().replace('-', "_");
    let mut name: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect();
    if name.is_empty() {
        return Err(SchemaNameError::Empty);
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, DIGIT_PREFIX);
    }
    TenantSchema::parse(&name)
}

/// Checks that need no database access.
fn validate_create_fields(req: &CreateBuildingRequest) -> Result<(String, String), AppError> {
    let code = validation::required("code", req.code.as_deref())?;
    validation::max_length("code", code, CODE_MAX_LEN)?;
    validation::matches("code", code, code_pattern())?;

    let name = validation::required("buildingName", req.building_name.as_deref())?;
    validation::max_length("buildingName", name, NAME_MAX_LEN)?;

    validation::minimum("totalAreaM2", req.total_area_m2, 0.0)?;
    validation::range("latitude", req.latitude, -90.0, 90.0)?;
    validation::range("longitude", req.longitude, -180.0, 180.0)?;
    Ok((code.to_string(), name.to_string()))
}

fn validate_update_fields(req: &UpdateBuildingRequest) -> Result<(), AppError> {
    if let Some(name) = req.building_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        validation::max_length("buildingName", name, NAME_MAX_LEN)?;
    }
    if let Some(status) = req.status {
        validation::one_of("status", &status, &[STATUS_INACTIVE, STATUS_ACTIVE])?;
    }
    validation::minimum("totalAreaM2", req.total_area_m2, 0.0)?;
    validation::range("latitude", req.latitude, -90.0, 90.0)?;
    validation::range("longitude", req.longitude, -180.0, 180.0)?;
    Ok(())
}

#[derive(Clone)]
pub struct BuildingService {
    registry: BuildingRegistry,
    runner: ScriptRunner,
    template_path: PathBuf,
}

impl BuildingService {
    pub fn new(registry: BuildingRegistry, runner: ScriptRunner, template_path: PathBuf) -> Self {
        BuildingService {
            registry,
            runner,
            template_path,
        }
    }

    /// Read the provisioning template. A template with no statements would register a
    /// building without tables, so it is refused.
    async fn load_template(&self) -> Result<String, AppError> {
        let template = tokio::fs::read_to_string(&self.template_path)
            .await
            .map_err(|e| ConfigError::Template(format!("{}: {}", self.template_path.display(), e)))?;
        if split_batches(&template).is_empty() {
            return Err(ConfigError::Template(format!(
                "{}: template has no statements",
                self.template_path.display()
            ))
            .into());
        }
        Ok(template)
    }

    /// Provision a new tenant. The building row is written only after its schema script
    /// committed; a failed script leaves neither schema nor row behind.
    pub async fn create_tenant(
        &self,
        req: CreateBuildingRequest,
        actor: Option<Uuid>,
    ) -> Result<Building, AppError> {
        let (code, name) = validate_create_fields(&req)?;
        let schema = schema_from_code(&code)?;

        if self.registry.code_exists(&code).await? {
            return Err(AppError::Conflict(format!("building code already exists: {}", code)));
        }
        if self.registry.schema_exists(schema.as_str()).await? {
            return Err(AppError::Conflict(format!("schema already in use: {}", schema)));
        }

        let template = self.load_template().await?;
        let script = transform_script(&template, schema.as_str())?;

        tracing::info!(code = %code, schema = %schema, "provisioning tenant schema");
        self.runner
            .execute(&script)
            .await
            .map_err(|source| AppError::Provisioning {
                schema: schema.to_string(),
                source,
            })?;

        let building = self
            .registry
            .insert(&NewBuilding {
                code,
                schema_name: schema.into_inner(),
                building_name: name,
                description: req.description,
                total_area_m2: req.total_area_m2,
                opening_date: req.opening_date,
                latitude: req.latitude,
                longitude: req.longitude,
                image_url: req.image_url,
                created_by: actor,
            })
            .await?;
        tracing::info!(id = %building.id, schema = %building.schema_name, "building registered");
        Ok(building)
    }

    pub async fn update_building(
        &self,
        id: Uuid,
        req: UpdateBuildingRequest,
        actor: Option<Uuid>,
    ) -> Result<Building, AppError> {
        validate_update_fields(&req)?;
        let mut building = self
            .registry
            .get_by_id(id)
            .await?
            .filter(|b| !b.is_deleted)
            .ok_or_else(|| AppError::NotFound(format!("building {}", id)))?;

        if let Some(name) = req.building_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            building.building_name = name.to_string();
        }
        if req.description.is_some() {
            building.description = req.description;
        }
        if req.total_area_m2.is_some() {
            building.total_area_m2 = req.total_area_m2;
        }
        if req.opening_date.is_some() {
            building.opening_date = req.opening_date;
        }
        if req.latitude.is_some() {
            building.latitude = req.latitude;
        }
        if req.longitude.is_some() {
            building.longitude = req.longitude;
        }
        if req.image_url.is_some() {
            building.image_url = req.image_url;
        }
        if let Some(status) = req.status {
            building.status = status;
        }
        building.updated_by = actor;

        self.registry.update(&building).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(code: &str, name: &str) -> CreateBuildingRequest {
        CreateBuildingRequest {
            code: Some(code.into()),
            building_name: Some(name.into()),
            ..Default::default()
        }
    }

    fn service_with_template(contents: &str) -> (BuildingService, PathBuf) {
        let path = std::env::temp_dir().join(format!("tenant_template_{}.sql", Uuid::new_v4().simple()));
        std::fs::write(&path, contents).unwrap();
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/tenancy_unreachable")
            .unwrap();
        let service = BuildingService::new(
            BuildingRegistry::new(pool.clone(), "core"),
            ScriptRunner::new(pool, std::time::Duration::from_secs(1)),
            path.clone(),
        );
        (service, path)
    }

    #[tokio::test]
    async fn blank_template_is_refused() {
        let (service, path) = service_with_template("\n  \nGO\n\nGO\n");
        let result = service.load_template().await;
        std::fs::remove_file(&path).unwrap();
        match result {
            Err(AppError::Config(ConfigError::Template(msg))) => assert!(msg.contains("no statements")),
            other => panic!("expected template error, got {:?}", other.map(|t| t.len())),
        }
    }

    #[tokio::test]
    async fn template_with_statements_is_loaded() {
        let (service, path) = service_with_template("CREATE SCHEMA [{{SCHEMA}}];\nGO\n");
        let result = service.load_template().await;
        std::fs::remove_file(&path).unwrap();
        assert!(result.unwrap().starts_with("CREATE SCHEMA"));
    }

    #[test]
    fn schema_is_derived_from_code() {
        assert_eq!(schema_from_code("HN-GREENPARK").unwrap().as_str(), "hn_greenpark");
        assert_eq!(schema_from_code("  Tower_A ").unwrap().as_str(), "tower_a");
        assert_eq!(schema_from_code("12-OAK").unwrap().as_str(), "b_12_oak");
        assert_eq!(schema_from_code("***"), Err(SchemaNameError::Empty));
    }

    #[test]
    fn create_requires_code_and_name() {
        assert!(validate_create_fields(&CreateBuildingRequest::default()).is_err());
        assert!(validate_create_fields(&create("HN1", "  ")).is_err());
        let (code, name) = validate_create_fields(&create(" HN1 ", " Green Park ")).unwrap();
        assert_eq!(code, "HN1");
        assert_eq!(name, "Green Park");
    }

    #[test]
    fn create_rejects_bad_codes_and_values() {
        assert!(validate_create_fields(&create("has space", "x")).is_err());
        assert!(validate_create_fields(&create(&"A".repeat(31), "x")).is_err());
        assert!(validate_create_fields(&create("OK", &"n".repeat(151))).is_err());
        let mut req = create("OK", "x");
        req.total_area_m2 = Some(-5.0);
        assert!(validate_create_fields(&req).is_err());
    }

    #[test]
    fn update_status_must_be_binary() {
        let req = UpdateBuildingRequest {
            status: Some(2),
            ..Default::default()
        };
        assert!(validate_update_fields(&req).is_err());
        let req = UpdateBuildingRequest {
            status: Some(0),
            building_name: Some("   ".into()),
            ..Default::default()
        };
        assert!(validate_update_fields(&req).is_ok());
    }
}
