//! Full and filtered scans of the rule table

use super::SqliteAdapter;
use crate::core::codec::{Rule, StoredRow};
use crate::core::filter::{Filter, Predicate};
use crate::error::Result;
use rusqlite::params_from_iter;
use tracing::{debug, info};

impl SqliteAdapter {
    /// Load every stored rule and mark the adapter unfiltered
    ///
    /// Rules come back in table-scan order; callers must not rely on it.
    pub fn load_all(&mut self) -> Result<Vec<Rule>> {
        let rules = self.select_rules(&Predicate::default())?;
        self.filtered = false;

        info!("Loaded {} rules from {}", rules.len(), self.table);
        Ok(rules)
    }

    /// Load the rules selected by `filter` and mark the adapter filtered
    ///
    /// An unsupported filter fails with `InvalidFilterType` before any query
    /// runs and leaves the filtered flag untouched. The flag is set even when
    /// no row matches.
    pub fn load_filtered(&mut self, filter: &Filter) -> Result<Vec<Rule>> {
        let predicate = filter.to_predicate()?;
        let rules = self.select_rules(&predicate)?;
        self.filtered = true;

        debug!(
            "Loaded {} rules from {} with filter {:?}",
            rules.len(),
            self.table,
            filter
        );
        Ok(rules)
    }

    /// Number of stored rows
    pub fn count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table.quoted());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn select_rules(&self, predicate: &Predicate) -> Result<Vec<Rule>> {
        let sql = format!(
            "SELECT ptype, v0, v1, v2, v3, v4, v5 FROM {}{}",
            self.table.quoted(),
            predicate.where_suffix()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rules = stmt
            .query_map(params_from_iter(predicate.params.iter()), StoredRow::from_row)?
            .map(|row| row.map(StoredRow::into_rule))
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rules)
    }
}
