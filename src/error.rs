//! Error types for policy storage operations

use thiserror::Error;

/// Policy storage result type
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Policy storage errors
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Filter argument is not a recognized shape, or names an unknown column
    #[error("Invalid filter type: {0}")]
    InvalidFilterType(String),

    /// Rule has more positional fields than the table has value columns
    #[error("Rule arity {arity} exceeds the {max} value columns of the rule table")]
    ArityExceeded { arity: usize, max: usize },

    /// Single-statement failure reported by SQLite
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A batch failed and was rolled back before this error surfaced
    #[error("Transaction failed during {operation} (rolled back): {source}")]
    Transaction {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// Batch update called with old/new lists of different lengths
    #[error("Mismatched update: {old} old rules vs {new} new rules")]
    MismatchedUpdate { old: usize, new: usize },

    #[error("Invalid table name: {0} (must be a plain SQL identifier)")]
    InvalidTableName(String),

    #[error("Unsupported database driver: {0}")]
    UnsupportedDriver(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
