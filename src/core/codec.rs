//! Rule codec
//!
//! Maps variable-arity policy rules to the fixed-width `ptype, v0..v5` rows of
//! the rule table and back. Padding and trimming only happen here, at the
//! storage boundary.

use crate::error::{AdapterError, Result};
use std::fmt;

/// Number of positional value columns (`v0`..`v5`)
pub const MAX_ARITY: usize = 6;

/// Value column names in storage order
pub const VALUE_COLUMNS: [&str; MAX_ARITY] = ["v0", "v1", "v2", "v3", "v4", "v5"];

/// A decoded policy rule: its section tag plus the ordered field values
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rule {
    /// Policy type ("p", "g", "p2", ...)
    pub ptype: String,
    /// Positional fields, never including the ptype
    pub values: Vec<String>,
}

impl Rule {
    pub fn new<S: AsRef<str>>(ptype: impl Into<String>, values: &[S]) -> Self {
        Rule {
            ptype: ptype.into(),
            values: values.iter().map(|v| v.as_ref().to_string()).collect(),
        }
    }

    /// Render in the model line format: `"p, alice, data1, read"`
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut line = self.ptype.clone();
        for value in &self.values {
            line.push_str(", ");
            line.push_str(value);
        }
        write!(f, "{}", line.trim())
    }
}

/// Persisted row shape
///
/// Invariant: `values[n]` is `Some` only for `n < arity` of the encoded rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub ptype: String,
    pub values: [Option<String>; MAX_ARITY],
}

impl StoredRow {
    /// Encode a rule into a fixed-width row
    ///
    /// # Errors
    ///
    /// Returns `ArityExceeded` if the rule has more than six fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use rule_table_adapter::StoredRow;
    ///
    /// let row = StoredRow::encode("p", &["alice", "data1", "read"]).unwrap();
    /// assert_eq!(row.values[2].as_deref(), Some("read"));
    /// assert_eq!(row.values[3], None);
    /// assert_eq!(row.decode(), vec!["alice", "data1", "read"]);
    /// ```
    pub fn encode<S: AsRef<str>>(ptype: &str, rule: &[S]) -> Result<Self> {
        if rule.len() > MAX_ARITY {
            return Err(AdapterError::ArityExceeded {
                arity: rule.len(),
                max: MAX_ARITY,
            });
        }

        let mut values: [Option<String>; MAX_ARITY] = Default::default();
        for (slot, value) in values.iter_mut().zip(rule) {
            *slot = Some(value.as_ref().to_string());
        }

        Ok(StoredRow {
            ptype: ptype.to_string(),
            values,
        })
    }

    /// Decode the positional fields back into a rule tuple
    ///
    /// Values are trimmed, and null or empty columns are dropped wherever they
    /// occur. A rule with an empty non-trailing field therefore collapses:
    /// `["alice", "", "read"]` decodes as `["alice", "read"]`.
    pub fn decode(&self) -> Vec<String> {
        self.values
            .iter()
            .flatten()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn into_rule(self) -> Rule {
        let values = self.decode();
        Rule {
            ptype: self.ptype.trim().to_string(),
            values,
        }
    }

    /// Read a row selected as `ptype, v0, v1, v2, v3, v4, v5`
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let mut values: [Option<String>; MAX_ARITY] = Default::default();
        for (idx, slot) in values.iter_mut().enumerate() {
            *slot = row.get(idx + 1)?;
        }

        Ok(StoredRow {
            ptype: row.get(0)?,
            values,
        })
    }

    /// Number of leading non-null columns
    pub fn arity(&self) -> usize {
        self.values.iter().take_while(|v| v.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_pads_unused_columns() {
        let row = StoredRow::encode("p", &["alice", "data1", "read"]).unwrap();

        assert_eq!(row.ptype, "p");
        assert_eq!(row.values[0].as_deref(), Some("alice"));
        assert_eq!(row.values[1].as_deref(), Some("data1"));
        assert_eq!(row.values[2].as_deref(), Some("read"));
        assert!(row.values[3..].iter().all(Option::is_none));
        assert_eq!(row.arity(), 3);
    }

    #[test]
    fn test_encode_full_width() {
        let rule = ["a", "b", "c", "d", "e", "f"];
        let row = StoredRow::encode("p", &rule).unwrap();
        assert_eq!(row.arity(), 6);
        assert_eq!(row.decode(), rule);
    }

    #[test]
    fn test_encode_rejects_seventh_field() {
        let rule = ["a", "b", "c", "d", "e", "f", "g"];
        let err = StoredRow::encode("p", &rule).unwrap_err();

        assert!(matches!(
            err,
            AdapterError::ArityExceeded { arity: 7, max: 6 }
        ));
    }

    #[test]
    fn test_decode_all_null_row() {
        let row = StoredRow::encode::<&str>("g", &[]).unwrap();
        assert!(row.decode().is_empty());
        assert_eq!(row.clone().into_rule().to_line(), "g");
    }

    #[test]
    fn test_decode_trims_whitespace() {
        let row = StoredRow {
            ptype: "p".to_string(),
            values: [
                Some("  alice ".to_string()),
                Some("data1\t".to_string()),
                Some(" read".to_string()),
                None,
                None,
                None,
            ],
        };

        assert_eq!(row.decode(), vec!["alice", "data1", "read"]);
    }

    #[test]
    fn test_decode_collapses_gaps() {
        // A null v2 with a non-null v3 yields a shorter tuple
        let row = StoredRow {
            ptype: "p".to_string(),
            values: [
                Some("alice".to_string()),
                Some("data1".to_string()),
                None,
                Some("read".to_string()),
                None,
                None,
            ],
        };

        assert_eq!(row.decode(), vec!["alice", "data1", "read"]);
    }

    #[test]
    fn test_empty_middle_field_is_lossy() {
        // Known boundary case: empty non-trailing fields do not survive the round trip
        let row = StoredRow::encode("p", &["alice", "", "read"]).unwrap();
        assert_eq!(row.values[1].as_deref(), Some(""));
        assert_eq!(row.decode(), vec!["alice", "read"]);
    }

    #[test]
    fn test_rule_line_format() {
        let rule = Rule::new("p", &["alice", "data1", "read"]);
        assert_eq!(rule.to_line(), "p, alice, data1, read");

        let grouping = Rule::new("g", &["alice", "data2_admin"]);
        assert_eq!(grouping.to_string(), "g, alice, data2_admin");
    }

    #[test]
    fn test_into_rule() {
        let row = StoredRow::encode("g", &["alice", "data2_admin"]).unwrap();
        let rule = row.into_rule();

        assert_eq!(rule.ptype, "g");
        assert_eq!(rule.values, vec!["alice", "data2_admin"]);
    }
}
