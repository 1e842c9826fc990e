//! SQLite rule store
//!
//! `SqliteAdapter` owns one `rusqlite::Connection` and a validated table name.
//! Loads live in `load`, inserts/deletes/updates in `mutation`. Every
//! multi-row mutation runs in a single transaction that is rolled back before
//! any error is returned.

mod load;
mod mutation;

use crate::config::AdapterConfig;
use crate::core::codec::{Rule, StoredRow};
use crate::core::filter::Filter;
use crate::core::model::{Model, GROUPING_SECTION, POLICY_SECTION};
use crate::core::validation::TableName;
use crate::error::{AdapterError, Result};
use rusqlite::{Connection, Transaction};
use tracing::{debug, info, warn};

/// Auto-save contract between a policy model and its storage
///
/// The `sec` arguments are accepted for compatibility with model callers;
/// rows are keyed by `ptype` alone.
pub trait Adapter {
    /// Feed every stored rule to the model
    fn load_policy(&mut self, model: &mut dyn Model) -> Result<()>;

    /// Feed only the rules selected by `filter`
    fn load_filtered_policy(&mut self, model: &mut dyn Model, filter: Filter) -> Result<()>;

    /// Persist every rule held by the model (permission rules, then grouping rules)
    fn save_policy(&mut self, model: &dyn Model) -> Result<()>;

    fn add_policy(&mut self, sec: &str, ptype: &str, rule: &[String]) -> Result<bool>;

    fn add_policies(&mut self, sec: &str, ptype: &str, rules: &[Vec<String>]) -> Result<bool>;

    fn remove_policy(&mut self, sec: &str, ptype: &str, rule: &[String]) -> Result<bool>;

    fn remove_policies(&mut self, sec: &str, ptype: &str, rules: &[Vec<String>]) -> Result<bool>;

    /// Remove rules whose fields starting at `field_index` match the non-empty `field_values`
    fn remove_filtered_policy(
        &mut self,
        sec: &str,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Result<bool>;

    fn update_policy(
        &mut self,
        sec: &str,
        ptype: &str,
        old_rule: &[String],
        new_rule: &[String],
    ) -> Result<bool>;

    fn update_policies(
        &mut self,
        sec: &str,
        ptype: &str,
        old_rules: &[Vec<String>],
        new_rules: &[Vec<String>],
    ) -> Result<bool>;

    /// Whether the last load was partial
    fn is_filtered(&self) -> bool;

    fn set_filtered(&mut self, filtered: bool);
}

/// Result of the work done inside a transaction
pub(crate) enum TxOutcome<T> {
    Commit(T),
    /// Discard everything the transaction did and return the value
    Rollback(T),
}

/// Policy rule storage backed by a SQLite table
pub struct SqliteAdapter {
    conn: Connection,
    table: TableName,
    /// Set by filtered loads, cleared by full loads
    filtered: bool,
}

impl SqliteAdapter {
    /// Wrap an open connection, using the default `casbin_rule` table
    pub fn new(conn: Connection) -> Self {
        Self::with_table(conn, TableName::default())
    }

    pub fn with_table(conn: Connection, table: TableName) -> Self {
        SqliteAdapter {
            conn,
            table,
            filtered: false,
        }
    }

    /// Open the database described by `config`
    ///
    /// The table is expected to exist; call [`create_table`](Self::create_table)
    /// to bootstrap a fresh database.
    pub fn open(config: &AdapterConfig) -> Result<Self> {
        config.validate()?;
        let table = config.table()?;

        if config.host.is_some() || config.port.is_some() || config.username.is_some() {
            debug!("Ignoring network settings for SQLite database {}", config.database);
        }

        let conn = if config.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.database)?
        };

        info!("Opened policy store {} (table {})", config.database, table);
        Ok(Self::with_table(conn, table))
    }

    /// Private in-memory database with the default table already created
    pub fn open_in_memory() -> Result<Self> {
        let adapter = Self::new(Connection::open_in_memory()?);
        adapter.create_table()?;
        Ok(adapter)
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Create the rule table if it does not exist
    pub fn create_table(&self) -> Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                ptype VARCHAR(255) NOT NULL,
                v0 VARCHAR(255),
                v1 VARCHAR(255),
                v2 VARCHAR(255),
                v3 VARCHAR(255),
                v4 VARCHAR(255),
                v5 VARCHAR(255)
            )",
            self.table.quoted()
        );
        self.conn.execute_batch(&sql)?;
        info!("Ensured rule table {}", self.table);
        Ok(())
    }

    pub fn drop_table_if_exists(&self) -> Result<()> {
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {}", self.table.quoted()))?;
        debug!("Dropped rule table {}", self.table);
        Ok(())
    }

    /// Whether the most recent load was filtered
    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    /// Override the filtered flag
    pub fn set_filtered(&mut self, filtered: bool) {
        self.filtered = filtered;
    }

    /// Run `f` inside one transaction
    ///
    /// Commits on `Ok(TxOutcome::Commit)`. Rolls back on `Ok(TxOutcome::Rollback)`
    /// and on error; an error is only returned after the rollback.
    pub(crate) fn with_transaction<T, F>(&mut self, operation: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<TxOutcome<T>>,
    {
        let tx = self.conn.transaction()?;

        match f(&tx) {
            Ok(TxOutcome::Commit(value)) => {
                // A failed commit drops the transaction, which rolls it back
                tx.commit()
                    .map_err(|source| AdapterError::Transaction { operation, source })?;
                Ok(value)
            }
            Ok(TxOutcome::Rollback(value)) => {
                tx.rollback()?;
                debug!("Rolled back {} on {}", operation, self.table);
                Ok(value)
            }
            Err(source) => {
                if let Err(e) = tx.rollback() {
                    warn!("Rollback of {} on {} failed: {}", operation, self.table, e);
                }
                Err(AdapterError::Transaction { operation, source })
            }
        }
    }
}

impl Adapter for SqliteAdapter {
    fn load_policy(&mut self, model: &mut dyn Model) -> Result<()> {
        for rule in self.load_all()? {
            model.load_policy_line(&rule.to_line());
        }
        Ok(())
    }

    fn load_filtered_policy(&mut self, model: &mut dyn Model, filter: Filter) -> Result<()> {
        for rule in self.load_filtered(&filter)? {
            model.load_policy_line(&rule.to_line());
        }
        Ok(())
    }

    fn save_policy(&mut self, model: &dyn Model) -> Result<()> {
        let rules: Vec<Rule> = [POLICY_SECTION, GROUPING_SECTION]
            .iter()
            .flat_map(|sec| model.policy_rules(sec))
            .collect();

        let rows = rules
            .iter()
            .map(|rule| StoredRow::encode(&rule.ptype, &rule.values))
            .collect::<Result<Vec<_>>>()?;

        let saved = self.insert_rows("save_policy", rows)?;
        info!("Saved {} rules to {}", saved, self.table);
        Ok(())
    }

    fn add_policy(&mut self, _sec: &str, ptype: &str, rule: &[String]) -> Result<bool> {
        self.insert_one(ptype, rule)?;
        Ok(true)
    }

    fn add_policies(&mut self, _sec: &str, ptype: &str, rules: &[Vec<String>]) -> Result<bool> {
        self.insert_many(ptype, rules)?;
        Ok(true)
    }

    fn remove_policy(&mut self, _sec: &str, ptype: &str, rule: &[String]) -> Result<bool> {
        Ok(self.delete_one(ptype, rule)? > 0)
    }

    fn remove_policies(&mut self, _sec: &str, ptype: &str, rules: &[Vec<String>]) -> Result<bool> {
        Ok(self.delete_many(ptype, rules)? > 0)
    }

    fn remove_filtered_policy(
        &mut self,
        _sec: &str,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Result<bool> {
        Ok(self.delete_matching(ptype, field_index, field_values)? > 0)
    }

    fn update_policy(
        &mut self,
        _sec: &str,
        ptype: &str,
        old_rule: &[String],
        new_rule: &[String],
    ) -> Result<bool> {
        self.update_one(ptype, old_rule, new_rule)
    }

    fn update_policies(
        &mut self,
        _sec: &str,
        ptype: &str,
        old_rules: &[Vec<String>],
        new_rules: &[Vec<String>],
    ) -> Result<bool> {
        self.update_many(ptype, old_rules, new_rules)
    }

    fn is_filtered(&self) -> bool {
        SqliteAdapter::is_filtered(self)
    }

    fn set_filtered(&mut self, filtered: bool) {
        SqliteAdapter::set_filtered(self, filtered)
    }
}
