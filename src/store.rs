//! Global schema DDL and database bootstrap. The global schema (from `TENANCY_GLOBAL_SCHEMA`,
//! default `core`) holds the building registry; tenant schemas are created by provisioning.

use crate::error::{AppError, ConfigError};
use crate::sql::{qualified, quote_ident};
use crate::tenant::registry::BUILDING_TABLE;
use crate::tenant::TenantSchema;
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

/// Create the global schema if not exists, then the building registry table.
pub async fn ensure_global_tables(pool: &PgPool, global_schema: &TenantSchema) -> Result<(), AppError> {
    sqlx::query(&format!(
        "CREATE SCHEMA IF NOT EXISTS {}",
        quote_ident(global_schema.as_str())
    ))
    .execute(pool)
    .await?;

    let q_building = qualified(global_schema.as_str(), BUILDING_TABLE);
    let building_ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id UUID PRIMARY KEY,
            code VARCHAR(30) NOT NULL,
            schema_name VARCHAR(128) NOT NULL,
            building_name VARCHAR(150) NOT NULL,
            status SMALLINT NOT NULL DEFAULT 1,
            description TEXT,
            total_area_m2 DOUBLE PRECISION,
            opening_date DATE,
            latitude DOUBLE PRECISION,
            longitude DOUBLE PRECISION,
            image_url VARCHAR(500),
            is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
            deleted_at TIMESTAMPTZ,
            created_by UUID,
            updated_by UUID,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ,
            CONSTRAINT uq_building_code UNIQUE (code),
            CONSTRAINT uq_building_schema UNIQUE (schema_name)
        )
        "#,
        q_building
    );
    sqlx::query(&building_ddl).execute(pool).await?;
    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS ix_building_status ON {} (status) WHERE NOT is_deleted",
        q_building
    ))
    .execute(pool)
    .await?;

    tracing::info!(schema = %global_schema, "global tables ready");
    Ok(())
}

/// Create the database named in `database_url` when it is missing. The check runs on an
/// admin connection to the `postgres` database, so call it before building the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin, target) = admin_target(database_url)?;
    let Some(db_name) = target else {
        return Ok(());
    };

    let mut conn = admin.connect().await?;
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if exists {
        tracing::debug!(database = %db_name, "database present");
        return Ok(());
    }
    sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
        .execute(&mut conn)
        .await?;
    tracing::info!(database = %db_name, "created database");
    Ok(())
}

/// Admin connect options for `url` and the database it names. `None` when the URL names
/// no database or names `postgres` itself.
fn admin_target(url: &str) -> Result<(PgConnectOptions, Option<String>), ConfigError> {
    let options = PgConnectOptions::from_str(url).map_err(|e| ConfigError::InvalidValue {
        key: "DATABASE_URL",
        message: e.to_string(),
    })?;
    let target = options
        .get_database()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "postgres")
        .map(str::to_string);
    Ok((options.database("postgres"), target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_target_names_the_database_to_create() {
        let (admin, target) = admin_target("postgres://u:p@localhost:5432/sams?sslmode=disable").unwrap();
        assert_eq!(target.as_deref(), Some("sams"));
        assert_eq!(admin.get_database(), Some("postgres"));
        assert_eq!(admin.get_host(), "localhost");
        assert_eq!(admin.get_port(), 5432);
    }

    #[test]
    fn admin_target_skips_the_admin_database() {
        let (_, target) = admin_target("postgres://u:p@localhost/postgres").unwrap();
        assert!(target.is_none());
    }

    #[test]
    fn malformed_url_is_a_config_error() {
        match admin_target("not a url") {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "DATABASE_URL"),
            other => panic!("expected DATABASE_URL error, got {:?}", other.map(|(_, t)| t)),
        }
    }
}
