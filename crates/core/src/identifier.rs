//! Allow-list validation for SQL identifiers.
//!
//! The generic fallback codec builds statements from payload keys and a
//! collection name. Every such identifier must pass through this module
//! before it reaches a query string.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Top-level collections (tables) the platform persists entities in.
pub const KNOWN_COLLECTIONS: &[&str] = &[
    "parts",
    "ecos",
    "work_orders",
    "inventory",
    "vendors",
    "purchase_orders",
    "quotes",
    "devices",
    "ncrs",
    "rmas",
    "shipments",
    "test_records",
    "field_reports",
];

/// Child tables of aggregate entities. They have composite keys and are
/// only written through their parent, never addressed as a collection.
pub const CHILD_COLLECTIONS: &[&str] = &["po_lines", "quote_lines"];

/// Column names: lowercase ASCII, leading letter, within the PostgreSQL
/// 63-byte identifier limit.
const COLUMN_PATTERN: &str = r"^[a-z][a-z0-9_]{0,62}$";

static COLUMN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(COLUMN_PATTERN).expect("valid regex"));

/// Validate a collection name against [`KNOWN_COLLECTIONS`].
///
/// Returns the allow-listed `'static` string rather than the input, so the
/// value interpolated into SQL is always one the platform defined.
pub fn sanitize_collection(name: &str) -> Result<&'static str, CoreError> {
    KNOWN_COLLECTIONS
        .iter()
        .find(|known| **known == name)
        .copied()
        .ok_or_else(|| CoreError::InvalidIdentifier(name.to_string()))
}

/// Validate a column name against the conservative identifier pattern.
pub fn sanitize_column(name: &str) -> Result<&str, CoreError> {
    if COLUMN_RE.is_match(name) {
        Ok(name)
    } else {
        Err(CoreError::InvalidIdentifier(name.to_string()))
    }
}

/// Returns `true` if `name` is one of the known top-level collections.
pub fn is_known_collection(name: &str) -> bool {
    KNOWN_COLLECTIONS.contains(&name)
}

/// Returns `true` if `name` is the child table of an aggregate.
pub fn is_child_collection(name: &str) -> bool {
    CHILD_COLLECTIONS.contains(&name)
}

/// Wrap an already-sanitized identifier in double quotes for SQL.
pub fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}
