//! SQL Safety Validator
//!
//! Lexical read-only gate applied to every generated query, once when the
//! query is produced and again at the execution gateway. Both call sites go
//! through `validate_sql`, so they reject identically.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlValidationError {
    #[error("Multiple statements are not allowed.")]
    MultipleStatements,

    #[error("Only SELECT statements are allowed.")]
    NotSelect,

    #[error("Forbidden keyword detected: {0}")]
    ForbiddenKeyword(String),

    #[error("Access to system tables is not allowed.")]
    SystemCatalog,
}

/// Checked in this order; the first hit is reported.
const FORBIDDEN_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "TRUNCATE", "ALTER", "CREATE", "GRANT",
    "REVOKE", "EXEC", "EXECUTE", "UNION",
];

lazy_static! {
    static ref SELECT_PREFIX: Regex = Regex::new(r"(?i)^\s*SELECT").unwrap();
    static ref KEYWORD_PATTERNS: Vec<(&'static str, Regex)> = FORBIDDEN_KEYWORDS
        .iter()
        .map(|k| (*k, Regex::new(&format!(r"(?i)\b{}\b", k)).unwrap()))
        .collect();
    static ref PG_CATALOG: Regex = Regex::new(r"(?i)\bpg_").unwrap();
    static ref INFORMATION_SCHEMA: Regex = Regex::new(r"(?i)\binformation_schema\b").unwrap();
}

/// Validate that `sql` is a single read-only SELECT statement.
pub fn validate_sql(sql: &str) -> Result<(), SqlValidationError> {
    let cleaned = sql.trim();

    // One trailing semicolon is tolerated
    let body = cleaned.strip_suffix(';').unwrap_or(cleaned);
    if body.contains(';') {
        return Err(SqlValidationError::MultipleStatements);
    }

    if !SELECT_PREFIX.is_match(cleaned) {
        return Err(SqlValidationError::NotSelect);
    }

    for (keyword, pattern) in KEYWORD_PATTERNS.iter() {
        if pattern.is_match(cleaned) {
            return Err(SqlValidationError::ForbiddenKeyword(keyword.to_string()));
        }
    }

    if PG_CATALOG.is_match(cleaned) || INFORMATION_SCHEMA.is_match(cleaned) {
        return Err(SqlValidationError::SystemCatalog);
    }

    Ok(())
}
