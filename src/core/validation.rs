//! Validation for rule table names
//!
//! The table name is the only identifier interpolated into SQL text (values are
//! always bound as parameters), so it is checked once at construction and
//! carried around as a validated newtype afterwards.

use crate::error::{AdapterError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Default table holding policy rules
pub const DEFAULT_TABLE_NAME: &str = "casbin_rule";

/// Validated SQL table name
///
/// # Rules
/// - ASCII letters, digits and underscores only
/// - Must start with a letter or underscore
/// - Length: 1-128 characters
///
/// # Examples
///
/// ```
/// use rule_table_adapter::TableName;
///
/// let table = TableName::new("casbin_rule").unwrap();
/// assert_eq!(table.as_str(), "casbin_rule");
///
/// assert!(TableName::new("rules; DROP TABLE users").is_err());
/// assert!(TableName::new("1rules").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Pattern for plain, unquoted SQL identifiers
    const PATTERN: &'static str = r"^[A-Za-z_][A-Za-z0-9_]*$";

    const MAX_LENGTH: usize = 128;

    /// Create a new validated table name
    ///
    /// # Errors
    ///
    /// Returns `InvalidTableName` if the name is empty, too long, or not a
    /// plain identifier.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::validate_name(&name)?;
        Ok(TableName(name))
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(AdapterError::InvalidTableName(
                "table name cannot be empty".to_string(),
            ));
        }

        if name.len() > Self::MAX_LENGTH {
            return Err(AdapterError::InvalidTableName(format!(
                "table name too long (max {} characters)",
                Self::MAX_LENGTH
            )));
        }

        if !Self::pattern()?.is_match(name) {
            return Err(AdapterError::InvalidTableName(name.to_string()));
        }

        Ok(())
    }

    /// Identifier pattern, compiled on first use
    fn pattern() -> Result<&'static Regex> {
        static COMPILED: OnceLock<Regex> = OnceLock::new();

        if let Some(re) = COMPILED.get() {
            return Ok(re);
        }
        let re = Regex::new(Self::PATTERN)
            .map_err(|e| AdapterError::InvalidTableName(format!("pattern error: {}", e)))?;
        Ok(COMPILED.get_or_init(|| re))
    }

    /// Get the table name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted identifier for use in SQL text
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl Default for TableName {
    fn default() -> Self {
        TableName(DEFAULT_TABLE_NAME.to_string())
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
