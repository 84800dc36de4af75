//! ClickHouse table schema.
//!
//! - LowCardinality for the low-variety `severity` / `source` columns
//! - DateTime64(3) for millisecond precision
//! - ReplacingMergeTree keyed on `id`, so a retried insert of the same
//!   event collapses on merge

/// Table holding every persisted log event.
pub const LOGS_TABLE: &str = "logs";

/// SQL for creating the logs table in the client's database.
pub const CREATE_LOGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS logs (
    id String,
    message String,
    severity LowCardinality(String),
    source LowCardinality(String),
    timestamp DateTime64(3),
    processed_at DateTime64(3)
)
ENGINE = ReplacingMergeTree()
ORDER BY id
SETTINGS index_granularity = 8192
"#;

/// `CREATE DATABASE` for the configured database name.
///
/// Callers must check the name with [`is_valid_identifier`] first; it is
/// interpolated, not bound.
pub fn create_database(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", database)
}

/// Accepts plain ClickHouse identifiers: ASCII letters, digits and `_`,
/// not starting with a digit.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
