//! Load `TenancyConfig` from the process environment (and `.env` when present).

use crate::config::types::TenancyConfig;
use crate::error::ConfigError;
use crate::tenant::TenantSchema;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

impl TenancyConfig {
    /// Read settings from the environment. Loads `.env` first; unset keys keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Schema names are checked with the
    /// strict identifier rule so a bad deployment value fails at startup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = TenancyConfig::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("DATABASE_URL") {
            cfg.database_url = v;
        }
        if let Some(v) = get("APP_HOST") {
            cfg.host = v;
        }
        if let Some(v) = get("APP_PORT") {
            cfg.port = parse("APP_PORT", &v)?;
        }
        if let Some(v) = get("DB_MAX_CONNECTIONS") {
            cfg.db_max_connections = parse("DB_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = get("TENANCY_DEFAULT_SCHEMA") {
            cfg.default_schema = schema("TENANCY_DEFAULT_SCHEMA", v)?;
        }
        if let Some(v) = get("TENANCY_GLOBAL_SCHEMA") {
            cfg.global_schema = schema("TENANCY_GLOBAL_SCHEMA", v)?;
        }
        if let Some(v) = get("TENANCY_CLAIM") {
            cfg.tenant_claim = v;
        }
        if let Some(v) = get("TENANCY_SWEEP_INTERVAL_SECS") {
            cfg.sweep_interval = seconds("TENANCY_SWEEP_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = get("TENANCY_BATCH_TIMEOUT_SECS") {
            cfg.batch_timeout = seconds("TENANCY_BATCH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("TENANCY_MODEL_CACHE_WARN") {
            cfg.model_cache_warn_threshold = parse("TENANCY_MODEL_CACHE_WARN", &v)?;
        }
        if let Some(v) = get("TENANCY_TEMPLATE_PATH") {
            cfg.template_path = PathBuf::from(v);
        }
        if let Some(v) = get("TENANCY_TRUST_FORWARDED_HEADERS") {
            cfg.trust_forwarded_headers = flag("TENANCY_TRUST_FORWARDED_HEADERS", &v)?;
        }
        if let Some(v) = get("APP_MAX_BODY_BYTES") {
            cfg.max_body_bytes = parse("APP_MAX_BODY_BYTES", &v)?;
        }
        Ok(cfg)
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key,
        message: e.to_string(),
    })
}

fn seconds(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = parse(key, raw)?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key,
            message: "must be greater than zero".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            message: format!("expected a boolean, got {:?}", raw),
        }),
    }
}

fn schema(key: &'static str, raw: String) -> Result<String, ConfigError> {
    TenantSchema::parse(&raw)
        .map(|s| s.into_inner())
        .map_err(|e| ConfigError::InvalidValue {
            key,
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TENANT_SCHEMA;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = TenancyConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.default_schema, DEFAULT_TENANT_SCHEMA);
        assert_eq!(cfg.sweep_interval, Duration::from_secs(30));
        assert_eq!(cfg.batch_timeout, Duration::from_secs(300));
        assert_eq!(cfg.tenant_claim, "building_id");
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = TenancyConfig::from_lookup(lookup(&[
            ("APP_PORT", "9000"),
            ("TENANCY_DEFAULT_SCHEMA", "fallback_01"),
            ("TENANCY_SWEEP_INTERVAL_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.default_schema, "fallback_01");
        assert_eq!(cfg.sweep_interval, Duration::from_secs(5));
    }

    #[test]
    fn rejects_unsafe_schema_names() {
        let err = TenancyConfig::from_lookup(lookup(&[("TENANCY_GLOBAL_SCHEMA", "core;drop")]));
        assert!(matches!(
            err,
            Err(ConfigError::InvalidValue { key: "TENANCY_GLOBAL_SCHEMA", .. })
        ));
    }

    #[test]
    fn parses_boolean_flags() {
        let cfg = TenancyConfig::from_lookup(lookup(&[("TENANCY_TRUST_FORWARDED_HEADERS", "TRUE")])).unwrap();
        assert!(cfg.trust_forwarded_headers);
        assert!(TenancyConfig::from_lookup(lookup(&[("TENANCY_TRUST_FORWARDED_HEADERS", "maybe")])).is_err());
    }

    #[test]
    fn rejects_zero_interval() {
        let err = TenancyConfig::from_lookup(lookup(&[("TENANCY_SWEEP_INTERVAL_SECS", "0")]));
        assert!(err.is_err());
    }
}
