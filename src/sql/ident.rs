use crate::tenant::TenantSchema;

/// Quote identifier for PostgreSQL.
pub fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Quote a string literal for PostgreSQL.
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Full qualified table name.
pub fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// Qualified table inside a tenant schema.
pub fn tenant_table(schema: &TenantSchema, table: &str) -> String {
    qualified(schema.as_str(), table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifiers_and_literals() {
        assert_eq!(quote_ident("HN-GREENPARK"), "\"HN-GREENPARK\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_literal("o'neil"), "'o''neil'");
        assert_eq!(qualified("core", "building"), "\"core\".\"building\"");
    }
}
