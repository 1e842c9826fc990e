//! Adapter configuration
//!
//! Connection settings come from a TOML document and can be overridden from
//! the environment (`DB_DRIVER`, `DB_HOST`, `DB_DATABASE`, `DB_USERNAME`,
//! `DB_PASSWORD`, `DB_PORT`, `DB_TABLE`).
//!
//! ```toml
//! driver = "sqlite"
//! database = "/var/lib/app/policy.db"
//! table_name = "casbin_rule"
//! ```

use crate::core::validation::{TableName, DEFAULT_TABLE_NAME};
use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// In-memory SQLite database name
pub const MEMORY_DATABASE: &str = ":memory:";

/// Supported database drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Sqlite,
}

impl Driver {
    /// Parse a driver identifier (case-insensitive)
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" | "pdo_sqlite" => Ok(Driver::Sqlite),
            _ => Err(AdapterError::UnsupportedDriver(s.to_string())),
        }
    }
}

/// Connection and table settings for the rule store
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Driver identifier, e.g. "sqlite"
    pub driver: String,

    /// Database file path, or ":memory:"
    pub database: String,

    /// Network drivers only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Network drivers only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Table holding the policy rules
    pub table_name: String,
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("driver", &self.driver)
            .field("database", &self.database)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig {
            driver: "sqlite".to_string(),
            database: "casbin.db".to_string(),
            host: None,
            port: None,
            username: None,
            password: None,
            table_name: DEFAULT_TABLE_NAME.to_string(),
        }
    }
}

impl AdapterConfig {
    /// Configuration for a private in-memory database
    pub fn in_memory() -> Self {
        AdapterConfig {
            database: MEMORY_DATABASE.to_string(),
            ..Self::default()
        }
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: AdapterConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading adapter config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Apply `DB_*` environment variables on top of this configuration
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(driver) = lookup("DB_DRIVER") {
            self.driver = driver;
        }
        if let Some(database) = lookup("DB_DATABASE") {
            self.database = database;
        }
        if let Some(host) = lookup("DB_HOST") {
            self.host = Some(host);
        }
        if let Some(port) = lookup("DB_PORT") {
            let port = port
                .parse::<u16>()
                .map_err(|e| AdapterError::Config(format!("invalid DB_PORT '{}': {}", port, e)))?;
            self.port = Some(port);
        }
        if let Some(username) = lookup("DB_USERNAME") {
            self.username = Some(username);
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            self.password = Some(password);
        }
        if let Some(table) = lookup("DB_TABLE") {
            self.table_name = table;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check driver, database and table name
    pub fn validate(&self) -> Result<()> {
        self.driver()?;
        self.table()?;

        if self.database.trim().is_empty() {
            return Err(AdapterError::Config("database cannot be empty".to_string()));
        }

        Ok(())
    }

    pub fn driver(&self) -> Result<Driver> {
        Driver::parse(&self.driver)
    }

    pub fn table(&self) -> Result<TableName> {
        TableName::new(self.table_name.clone())
    }

    pub fn is_in_memory(&self) -> bool {
        self.database == MEMORY_DATABASE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AdapterConfig::default();
        assert_eq!(config.driver().unwrap(), Driver::Sqlite);
        assert_eq!(config.table_name, "casbin_rule");
        assert!(!config.is_in_memory());
        assert!(AdapterConfig::in_memory().is_in_memory());
    }

    #[test]
    fn test_from_toml_str() {
        let config = AdapterConfig::from_toml_str(
            r#"
            driver = "pdo_sqlite"
            database = "/tmp/policy.db"
            table_name = "rules"
            "#,
        )
        .unwrap();

        assert_eq!(config.driver().unwrap(), Driver::Sqlite);
        assert_eq!(config.database, "/tmp/policy.db");
        assert_eq!(config.table().unwrap().as_str(), "rules");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AdapterConfig::from_toml_str(r#"database = ":memory:""#).unwrap();
        assert!(config.is_in_memory());
        assert_eq!(config.table_name, DEFAULT_TABLE_NAME);
    }

    #[test]
    fn test_unsupported_driver() {
        let err = AdapterConfig::from_toml_str(r#"driver = "pdo_mysql""#).unwrap_err();
        assert!(matches!(err, AdapterError::UnsupportedDriver(_)));
    }

    #[test]
    fn test_invalid_table_name() {
        let err = AdapterConfig::from_toml_str(r#"table_name = "rules; --""#).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidTableName(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = AdapterConfig::from_toml_str("database = ").unwrap_err();
        assert!(matches!(err, AdapterError::ConfigParse(_)));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("DB_DATABASE", "override.db"),
            ("DB_HOST", "127.0.0.1"),
            ("DB_PORT", "3306"),
            ("DB_USERNAME", "root"),
            ("DB_TABLE", "policy_rules"),
        ]
        .into_iter()
        .collect();

        let config = AdapterConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database, "override.db");
        assert_eq!(config.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(config.port, Some(3306));
        assert_eq!(config.username.as_deref(), Some("root"));
        assert_eq!(config.password, None);
        assert_eq!(config.table_name, "policy_rules");
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = AdapterConfig::default()
            .with_overrides(|key| (key == "DB_PASSWORD").then(|| "s3cret".to_string()))
            .unwrap();
        assert_eq!(config.password.as_deref(), Some("s3cret"));

        let printed = format!("{:?}", config);
        assert!(!printed.contains("s3cret"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("casbin.db"));

        assert!(format!("{:?}", AdapterConfig::default()).contains("password: None"));
    }

    #[test]
    fn test_invalid_port_override() {
        let err = AdapterConfig::default()
            .with_overrides(|key| (key == "DB_PORT").then(|| "not-a-port".to_string()))
            .unwrap_err();
        assert!(matches!(err, AdapterError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("adapter.toml");
        std::fs::write(&path, "database = \"policy.db\"\n").unwrap();

        let config = AdapterConfig::from_file(&path).unwrap();
        assert_eq!(config.database, "policy.db");

        assert!(matches!(
            AdapterConfig::from_file(dir.path().join("missing.toml")),
            Err(AdapterError::Io(_))
        ));
    }
}
