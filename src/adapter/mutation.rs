//! Inserts, deletes and updates of rule rows
//!
//! Single-row operations run as one statement. Batch operations encode every
//! rule before opening a transaction, so arity errors never reach storage.

use super::{SqliteAdapter, TxOutcome};
use crate::core::codec::{StoredRow, MAX_ARITY};
use crate::core::filter::{Column, FieldFilter, Filter, Predicate};
use crate::core::validation::TableName;
use crate::error::{AdapterError, Result};
use rusqlite::{params, params_from_iter, Connection};
use tracing::debug;

fn insert_sql(table: &TableName) -> String {
    format!(
        "INSERT INTO {} (ptype, v0, v1, v2, v3, v4, v5) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        table.quoted()
    )
}

fn insert_row(conn: &Connection, sql: &str, row: &StoredRow) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare_cached(sql)?;
    stmt.execute(params![
        row.ptype,
        row.values[0],
        row.values[1],
        row.values[2],
        row.values[3],
        row.values[4],
        row.values[5],
    ])
}

/// Exact-match clause: ptype and every value of the rule, trailing columns null or empty
fn exact_match(ptype: &str, row: &StoredRow) -> Predicate {
    let arity = row.arity();
    let mut columns = vec![(Column::Ptype, ptype)];
    columns.extend(
        row.values
            .iter()
            .take(arity)
            .enumerate()
            .filter_map(|(idx, value)| value.as_deref().map(|v| (Column::Value(idx), v))),
    );

    Predicate::from_columns(columns).and_absent((arity..MAX_ARITY).map(Column::Value))
}

fn delete_where(
    conn: &Connection,
    table: &TableName,
    predicate: &Predicate,
) -> rusqlite::Result<usize> {
    let sql = format!("DELETE FROM {}{}", table.quoted(), predicate.where_suffix());
    conn.execute(&sql, params_from_iter(predicate.params.iter()))
}

fn encode_all<R, S>(ptype: &str, rules: &[R]) -> Result<Vec<StoredRow>>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    rules
        .iter()
        .map(|rule| StoredRow::encode(ptype, rule.as_ref()))
        .collect()
}

impl SqliteAdapter {
    /// Append one rule row
    ///
    /// No uniqueness check is made; inserting the same rule twice stores two rows.
    pub fn insert_one<S: AsRef<str>>(&mut self, ptype: &str, rule: &[S]) -> Result<()> {
        let row = StoredRow::encode(ptype, rule)?;
        insert_row(&self.conn, &insert_sql(&self.table), &row)?;

        debug!("Inserted {} rule into {}", ptype, self.table);
        Ok(())
    }

    /// Append several rules atomically: all rows are stored or none are
    pub fn insert_many<R, S>(&mut self, ptype: &str, rules: &[R]) -> Result<usize>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let rows = encode_all(ptype, rules)?;
        self.insert_rows("insert_many", rows)
    }

    pub(crate) fn insert_rows(
        &mut self,
        operation: &'static str,
        rows: Vec<StoredRow>,
    ) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let sql = insert_sql(&self.table);
        let inserted = self.with_transaction(operation, |tx| {
            for row in &rows {
                insert_row(tx, &sql, row)?;
            }
            Ok(TxOutcome::Commit(rows.len()))
        })?;

        debug!("Inserted {} rows into {} ({})", inserted, self.table, operation);
        Ok(inserted)
    }

    /// Delete rows whose fields starting at `field_index` match `field_values`
    ///
    /// Empty values leave their column unconstrained. Columns past `v5` are
    /// ignored. Returns the number of rows deleted.
    pub fn delete_matching<S: AsRef<str>>(
        &mut self,
        ptype: &str,
        field_index: usize,
        field_values: &[S],
    ) -> Result<usize> {
        let mut filter = FieldFilter::new().with(Column::Ptype.name(), ptype);
        for (offset, value) in field_values.iter().enumerate() {
            let value = value.as_ref();
            if value.is_empty() {
                continue;
            }
            if let Some(column) = Column::value(field_index.saturating_add(offset)) {
                filter = filter.with(column.name(), value);
            }
        }

        let predicate = Filter::Fields(filter).to_predicate()?;
        let deleted = delete_where(&self.conn, &self.table, &predicate)?;

        debug!(
            "Deleted {} {} rows from {} matching {}",
            deleted, ptype, self.table, predicate.sql
        );
        Ok(deleted)
    }

    /// Delete the rows exactly matching one rule
    pub fn delete_one<S: AsRef<str>>(&mut self, ptype: &str, rule: &[S]) -> Result<usize> {
        let row = StoredRow::encode(ptype, rule)?;
        let deleted = delete_where(&self.conn, &self.table, &exact_match(ptype, &row))?;

        debug!("Deleted {} {} rows from {}", deleted, ptype, self.table);
        Ok(deleted)
    }

    /// Delete the rows exactly matching each rule, atomically
    ///
    /// If any delete fails, every row deleted by this call is restored.
    pub fn delete_many<R, S>(&mut self, ptype: &str, rules: &[R]) -> Result<usize>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let predicates: Vec<Predicate> = encode_all(ptype, rules)?
            .iter()
            .map(|row| exact_match(ptype, row))
            .collect();
        if predicates.is_empty() {
            return Ok(0);
        }

        let table = self.table.clone();
        let deleted = self.with_transaction("delete_many", |tx| {
            let mut deleted = 0;
            for predicate in &predicates {
                deleted += delete_where(tx, &table, predicate)?;
            }
            Ok(TxOutcome::Commit(deleted))
        })?;

        debug!("Deleted {} {} rows from {}", deleted, ptype, self.table);
        Ok(deleted)
    }

    /// Replace one rule with another in a single transaction
    ///
    /// Returns `false` and changes nothing if `old_rule` is not stored.
    pub fn update_one<S, T>(&mut self, ptype: &str, old_rule: &[S], new_rule: &[T]) -> Result<bool>
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        self.update_many::<&[S], S, &[T], T>(ptype, &[old_rule], &[new_rule])
    }

    /// Replace each old rule with the new rule at the same position
    ///
    /// All old rules are deleted before any new rule is inserted, and all pairs
    /// commit together. If any old rule is missing the whole batch is rolled
    /// back and `false` is returned; storage errors roll back as well.
    pub fn update_many<R, S, N, T>(
        &mut self,
        ptype: &str,
        old_rules: &[R],
        new_rules: &[N],
    ) -> Result<bool>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
        N: AsRef<[T]>,
        T: AsRef<str>,
    {
        if old_rules.len() != new_rules.len() {
            return Err(AdapterError::MismatchedUpdate {
                old: old_rules.len(),
                new: new_rules.len(),
            });
        }

        let old_predicates: Vec<Predicate> = encode_all(ptype, old_rules)?
            .iter()
            .map(|row| exact_match(ptype, row))
            .collect();
        let new_rows = encode_all(ptype, new_rules)?;
        if new_rows.is_empty() {
            return Ok(true);
        }

        let table = self.table.clone();
        let sql = insert_sql(&table);
        let updated = self.with_transaction("update_many", |tx| {
            // All deletes first: a later old rule must not match a row this batch inserted
            for predicate in &old_predicates {
                if delete_where(tx, &table, predicate)? == 0 {
                    return Ok(TxOutcome::Rollback(false));
                }
            }
            for row in &new_rows {
                insert_row(tx, &sql, row)?;
            }
            Ok(TxOutcome::Commit(true))
        })?;

        debug!(
            "Updated {} {} rules in {} (applied: {})",
            new_rows.len(),
            ptype,
            self.table,
            updated
        );
        Ok(updated)
    }

    /// Delete every stored rule
    pub fn clear(&mut self) -> Result<usize> {
        let deleted = delete_where(&self.conn, &self.table, &Predicate::default())?;
        debug!("Cleared {} rows from {}", deleted, self.table);
        Ok(deleted)
    }
}
