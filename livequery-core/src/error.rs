//! Error types for livequery operations

use thiserror::Error;

/// Table and column wiring errors.
///
/// These are raised while tables are constructed at startup and are fatal
/// to startup. None of them can occur while a query is being answered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Duplicate column {column} in table {table}")]
    DuplicateColumn { table: String, column: String },

    #[error("Column {column} is rooted at {found}, expected {expected}")]
    RowTypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Empty column name in table {table}")]
    EmptyName { table: String },

    #[error("Duplicate table: {table}")]
    DuplicateTable { table: String },

    #[error("Unknown table: {table}")]
    UnknownTable { table: String },

    #[error("Unknown column {column} in table {table}")]
    UnknownColumn { table: String, column: String },
}

/// Errors raised by the collaborator that owns the live collections.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Monitoring state lock poisoned")]
    LockPoisoned,

    #[error("Duplicate {kind}: {key}")]
    DuplicateEntity { kind: &'static str, key: String },

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("{kind} {key} refers to an entity that is not registered")]
    DanglingReference { kind: &'static str, key: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config TOML: {reason}")]
    Parse { reason: String },
}

/// Master error type for all livequery errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LiveQueryError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for livequery operations.
pub type LiveQueryResult<T> = Result<T, LiveQueryError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display_duplicate_column() {
        let err = SchemaError::DuplicateColumn {
            table: "comments".to_string(),
            column: "host_name".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Duplicate column"));
        assert!(msg.contains("comments"));
        assert!(msg.contains("host_name"));
    }

    #[test]
    fn test_schema_error_display_row_type_mismatch() {
        let err = SchemaError::RowTypeMismatch {
            column: "name".to_string(),
            expected: "Comment",
            found: "Host",
        };
        let msg = format!("{}", err);
        assert!(msg.contains("rooted at Host"));
        assert!(msg.contains("expected Comment"));
    }

    #[test]
    fn test_store_error_display_not_found() {
        let err = StoreError::NotFound {
            kind: "comment",
            key: "42".to_string(),
        };
        assert_eq!(format!("{}", err), "comment not found: 42");
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "service_authorization".to_string(),
            value: "sometimes".to_string(),
            reason: "expected loose or strict".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("service_authorization"));
        assert!(msg.contains("sometimes"));
        assert!(msg.contains("expected loose or strict"));
    }

    #[test]
    fn test_livequery_error_from_variants() {
        let schema = LiveQueryError::from(SchemaError::DuplicateTable {
            table: "hosts".to_string(),
        });
        assert!(matches!(schema, LiveQueryError::Schema(_)));

        let store = LiveQueryError::from(StoreError::LockPoisoned);
        assert!(matches!(store, LiveQueryError::Store(_)));

        let config = LiveQueryError::from(ConfigError::Parse {
            reason: "eof".to_string(),
        });
        assert!(matches!(config, LiveQueryError::Config(_)));
    }
}
