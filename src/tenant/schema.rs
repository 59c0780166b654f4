//! Schema identifiers that are safe to splice into dynamically built SQL.

use crate::error::SchemaNameError;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn strict_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static pattern"))
}

/// Claim values may also carry `-` (building codes such as `HN-GREENPARK`).
fn claim_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("static pattern"))
}

/// A validated schema name. Only constructible through [`TenantSchema::parse`] or
/// [`TenantSchema::from_claim`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TenantSchema(String);

impl TenantSchema {
    /// Strict identifier rule: `^[A-Za-z_][A-Za-z0-9_]*$`.
    pub fn parse(candidate: &str) -> Result<Self, SchemaNameError> {
        check(candidate, strict_pattern())
    }

    /// Rule for tenant claims arriving on the request path. Same as [`parse`](Self::parse)
    /// but admits `-` after the first character.
    pub fn from_claim(candidate: &str) -> Result<Self, SchemaNameError> {
        check(candidate, claim_pattern())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

fn check(candidate: &str, pattern: &Regex) -> Result<TenantSchema, SchemaNameError> {
    if candidate.is_empty() {
        return Err(SchemaNameError::Empty);
    }
    if !pattern.is_match(candidate) {
        return Err(SchemaNameError::Invalid(candidate.to_string()));
    }
    Ok(TenantSchema(candidate.to_string()))
}

/// Validate a schema name with the strict identifier rule.
pub fn validate(candidate: &str) -> Result<TenantSchema, SchemaNameError> {
    TenantSchema::parse(candidate)
}

impl fmt::Display for TenantSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantSchema {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for TenantSchema {
    type Err = SchemaNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TenantSchema::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_identifiers() {
        for ok in ["building_01", "_x", "A", "tenant_42", "Building"] {
            assert_eq!(validate(ok).unwrap().as_str(), ok);
        }
    }

    #[test]
    fn rejects_non_identifiers() {
        assert_eq!(validate(""), Err(SchemaNameError::Empty));
        for bad in [
            " ", "1abc", "ab;DROP", "a b", "[x]", "x]", "a.b", "a'b", "a\"b", "a-b", "tenant\n", "é",
        ] {
            assert!(validate(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn claim_rule_admits_hyphenated_codes_only() {
        assert_eq!(
            TenantSchema::from_claim("HN-GREENPARK").unwrap().as_str(),
            "HN-GREENPARK"
        );
        assert!(TenantSchema::from_claim("bad id!").is_err());
        assert!(TenantSchema::from_claim("-lead").is_err());
        assert!(TenantSchema::from_claim("x;--").is_err());
        assert!(TenantSchema::from_claim("").is_err());
    }

    #[test]
    fn strict_and_from_str_agree() {
        let a: TenantSchema = "tenant_1".parse().unwrap();
        assert_eq!(a, TenantSchema::parse("tenant_1").unwrap());
        assert!("tenant-1".parse::<TenantSchema>().is_err());
    }
}
