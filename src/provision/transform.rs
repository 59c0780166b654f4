//! Materialize a tenant provisioning script from the schema-agnostic template.
//!
//! The template names the tenant schema through [`SCHEMA_PLACEHOLDER`] and may still carry
//! legacy existence checks written as `COL_LENGTH('[schema].table', 'col') IS NULL` and
//! `OBJECT_ID('[schema].table', 'U')`. Both are rewritten into `pg_catalog` lookups scoped
//! to the substituted schema. Output is executed as-is, so nothing downstream re-checks it.

use crate::error::SchemaNameError;
use crate::sql::quote_literal;
use crate::tenant::TenantSchema;
use regex::{Captures, Regex};
use std::sync::OnceLock;

pub const SCHEMA_PLACEHOLDER: &str = "{{SCHEMA}}";

fn col_length_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)IF\s+COL_LENGTH\s*\(\s*'\[(?P<schema>[^\]']+)\]\.\[?(?P<table>[^\]'.]+)\]?'\s*,\s*'(?P<col>[^']+)'\s*\)\s+IS\s+NULL",
        )
        .expect("static pattern")
    })
}

fn object_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)OBJECT_ID\s*\(\s*'\[(?P<schema>[^\]']+)\]\.\[?(?P<table>[^\]'.]+)\]?'\s*,\s*'(?P<kind>[^']*)'\s*\)",
        )
        .expect("static pattern")
    })
}

/// Substitute `schema_name` into `template` and repair legacy catalog checks.
///
/// An empty template is returned unchanged. The schema name must pass the strict
/// identifier rule; the template is expected to quote the placeholder itself.
pub fn transform_script(template: &str, schema_name: &str) -> Result<String, SchemaNameError> {
    if template.trim().is_empty() {
        return Ok(template.to_string());
    }
    let schema = TenantSchema::parse(schema_name)?;

    let script = template.replace(SCHEMA_PLACEHOLDER, schema.as_str());

    let script = col_length_pattern().replace_all(&script, |caps: &Captures| {
        column_exists_check(&caps["schema"], &caps["table"], &caps["col"])
    });

    let script = object_id_pattern().replace_all(&script, |caps: &Captures| {
        object_lookup(&caps["schema"], &caps["table"], &caps["kind"])
    });

    Ok(script.into_owned())
}

fn column_exists_check(schema: &str, table: &str, column: &str) -> String {
    format!(
        "IF NOT EXISTS (SELECT 1 FROM pg_catalog.pg_attribute a \
         JOIN pg_catalog.pg_class c ON a.attrelid = c.oid \
         JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid \
         WHERE n.nspname = {} AND c.relname = {} AND a.attname = {} AND NOT a.attisdropped)",
        quote_literal(schema.trim()),
        quote_literal(table.trim()),
        quote_literal(column.trim())
    )
}

fn object_lookup(schema: &str, table: &str, kind: &str) -> String {
    let kind_filter = relkinds(kind)
        .map(|kinds| {
            let list: Vec<String> = kinds.iter().map(|k| quote_literal(k)).collect();
            format!(" AND c.relkind IN ({})", list.join(", "))
        })
        .unwrap_or_default();
    format!(
        "(SELECT c.oid FROM pg_catalog.pg_class c \
         JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid \
         WHERE n.nspname = {} AND c.relname = {}{})",
        quote_literal(schema.trim()),
        quote_literal(table.trim()),
        kind_filter
    )
}

const TABLE_KINDS: &[&str] = &["r", "p"];
const VIEW_KINDS: &[&str] = &["v", "m"];
const SEQUENCE_KINDS: &[&str] = &["S"];

/// Object type codes of the legacy checks mapped to `pg_class.relkind`. Unknown or empty
/// codes match any relation.
fn relkinds(kind: &str) -> Option<&'static [&'static str]> {
    match kind.trim().to_ascii_uppercase().as_str() {
        "U" => Some(TABLE_KINDS),
        "V" => Some(VIEW_KINDS),
        "SO" => Some(SEQUENCE_KINDS),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"CREATE SCHEMA "{{SCHEMA}}";
GO
CREATE TABLE "{{SCHEMA}}".announcements (announcement_id UUID PRIMARY KEY);
GO
DO $$
BEGIN
    IF COL_LENGTH('[{{SCHEMA}}].announcements', 'booking_id') IS NULL THEN
        ALTER TABLE "{{SCHEMA}}".announcements ADD COLUMN booking_id UUID;
    END IF;
    IF OBJECT_ID('[{{SCHEMA}}].announcement_reads', 'U') IS NULL THEN
        CREATE TABLE "{{SCHEMA}}".announcement_reads (id UUID PRIMARY KEY);
    END IF;
END $$;
"#;

    #[test]
    fn substitutes_and_rewrites_column_checks() {
        let out = transform_script(TEMPLATE, "tenant_42").unwrap();
        assert!(!out.contains(SCHEMA_PLACEHOLDER));
        assert!(!out.to_uppercase().contains("COL_LENGTH"));
        assert!(out.contains("n.nspname = 'tenant_42' AND c.relname = 'announcements' AND a.attname = 'booking_id'"));
        assert!(out.contains(r#"CREATE SCHEMA "tenant_42";"#));
        assert!(out.contains(r#"ALTER TABLE "tenant_42".announcements ADD COLUMN booking_id UUID;"#));
    }

    #[test]
    fn rewrites_object_lookups_with_kind() {
        let out = transform_script(TEMPLATE, "tenant_42").unwrap();
        assert!(!out.contains("OBJECT_ID"));
        assert!(out.contains(
            "IF (SELECT c.oid FROM pg_catalog.pg_class c JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid \
             WHERE n.nspname = 'tenant_42' AND c.relname = 'announcement_reads' AND c.relkind IN ('r', 'p')) IS NULL THEN"
        ));
    }

    #[test]
    fn handles_bracketed_table_and_loose_spacing() {
        let t = "if  col_length ( '[{{SCHEMA}}].[invoices]' , 'due_date' )  is   null";
        let out = transform_script(t, "b1").unwrap();
        assert!(out.starts_with("IF NOT EXISTS (SELECT 1 FROM pg_catalog.pg_attribute"));
        assert!(out.contains("c.relname = 'invoices'"));
        assert!(out.contains("a.attname = 'due_date'"));
    }

    #[test]
    fn object_lookup_without_kind_has_no_filter() {
        let out = transform_script("SELECT OBJECT_ID('[{{SCHEMA}}].x', '')", "b1").unwrap();
        assert!(out.contains("c.relname = 'x')"));
        assert!(!out.contains("relkind"));
    }

    #[test]
    fn is_idempotent() {
        let a = transform_script(TEMPLATE, "tenant_42").unwrap();
        let b = transform_script(TEMPLATE, "tenant_42").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_bad_schema_names() {
        assert_eq!(transform_script(TEMPLATE, ""), Err(SchemaNameError::Empty));
        assert!(transform_script(TEMPLATE, "x\"; DROP SCHEMA public; --").is_err());
        assert!(transform_script(TEMPLATE, "HN-GREENPARK").is_err());
        assert!(transform_script(TEMPLATE, "9lives").is_err());
    }

    #[test]
    fn empty_template_passes_through() {
        assert_eq!(transform_script("", "tenant_1").unwrap(), "");
        assert_eq!(transform_script("  \n", "").unwrap(), "  \n");
    }

    #[test]
    fn leaves_unrelated_sql_alone() {
        let t = "SELECT COL_LENGTH_X FROM t; -- OBJECT_ID mentioned in a comment";
        assert_eq!(transform_script(t, "tenant_1").unwrap(), t);
    }
}
