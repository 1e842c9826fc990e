//! Filters for partial loads and deletes
//!
//! A `Filter` selects a subset of rule rows:
//! - `Fields` - exact match on listed columns, other columns unconstrained
//! - `Raw` - a SQLite boolean expression used verbatim as the WHERE clause
//! - `Unsupported` - any other input shape, rejected before a query is built

use super::codec::{MAX_ARITY, VALUE_COLUMNS};
use crate::error::{AdapterError, Result};
use serde_json::Value;

/// A filterable column of the rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Ptype,
    /// Positional value column `v0`..`v5`
    Value(usize),
}

impl Column {
    /// Parse a column name (`ptype`, `v0`..`v5`)
    pub fn parse(name: &str) -> Result<Self> {
        if name == "ptype" {
            return Ok(Column::Ptype);
        }

        VALUE_COLUMNS
            .iter()
            .position(|c| *c == name)
            .map(Column::Value)
            .ok_or_else(|| AdapterError::InvalidFilterType(format!("unknown column '{}'", name)))
    }

    /// Positional column for an index, `None` outside `v0..v5`
    pub fn value(index: usize) -> Option<Self> {
        (index < MAX_ARITY).then_some(Column::Value(index))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Column::Ptype => "ptype",
            Column::Value(idx) => VALUE_COLUMNS[*idx],
        }
    }
}

/// Exact-match conditions on named columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFilter {
    conditions: Vec<(String, String)>,
}

impl FieldFilter {
    /// Create an empty filter (matches every row)
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair the i-th field name with the i-th value
    ///
    /// Both lists must have the same length. Extra entries on either side are
    /// ignored in release builds.
    pub fn from_parallel<N, V>(names: &[N], values: &[V]) -> Self
    where
        N: AsRef<str>,
        V: AsRef<str>,
    {
        debug_assert_eq!(
            names.len(),
            values.len(),
            "field filter names and values must have equal length"
        );

        FieldFilter {
            conditions: names
                .iter()
                .zip(values)
                .map(|(n, v)| (n.as_ref().to_string(), v.as_ref().to_string()))
                .collect(),
        }
    }

    /// Add a condition `field = value`
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Conditions as (field name, value) pairs in insertion order
    pub fn conditions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.conditions
            .iter()
            .map(|(f, v)| (f.as_str(), v.as_str()))
    }

    /// Resolve field names to columns, failing on the first unknown name
    pub fn resolve(&self) -> Result<Vec<(Column, &str)>> {
        self.conditions
            .iter()
            .map(|(field, value)| Ok((Column::parse(field)?, value.as_str())))
            .collect()
    }
}

/// Row selector for filtered loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Exact-match conditions on `ptype` / `v0..v5`
    Fields(FieldFilter),
    /// Opaque SQLite boolean expression
    Raw(String),
    /// Unrecognized input shape; the string describes what was received
    Unsupported(String),
}

impl Filter {
    /// Interpret a dynamically shaped filter argument
    ///
    /// - a JSON string becomes `Raw`
    /// - `{"fields": [...], "values": [...]}` becomes `Fields` (parallel lists)
    /// - an object whose values are all strings becomes `Fields` (column map)
    /// - anything else becomes `Unsupported`
    ///
    /// # Examples
    ///
    /// ```
    /// use rule_table_adapter::Filter;
    /// use serde_json::json;
    ///
    /// assert!(matches!(Filter::parse(&json!("v0 = 'alice'")), Filter::Raw(_)));
    /// assert!(matches!(Filter::parse(&json!({"v0": "alice"})), Filter::Fields(_)));
    /// assert!(matches!(Filter::parse(&json!(42)), Filter::Unsupported(_)));
    /// ```
    pub fn parse(input: &Value) -> Filter {
        match input {
            Value::String(expr) => Filter::Raw(expr.clone()),
            Value::Object(map) => {
                if let (Some(fields), Some(values)) = (map.get("fields"), map.get("values")) {
                    return match (string_list(fields), string_list(values)) {
                        (Some(names), Some(values)) if names.len() == values.len() => {
                            Filter::Fields(FieldFilter::from_parallel(&names, &values))
                        }
                        _ => Filter::Unsupported(
                            "object with mismatched or non-string fields/values lists".to_string(),
                        ),
                    };
                }

                let mut filter = FieldFilter::new();
                for (field, value) in map {
                    match value {
                        Value::String(v) => filter = filter.with(field.clone(), v.clone()),
                        other => {
                            return Filter::Unsupported(format!(
                                "object with {} value for '{}'",
                                json_kind(other),
                                field
                            ))
                        }
                    }
                }
                Filter::Fields(filter)
            }
            other => Filter::Unsupported(json_kind(other).to_string()),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Filter::Unsupported(_))
    }

    /// Build the WHERE clause, rejecting unsupported shapes and unknown columns
    pub(crate) fn to_predicate(&self) -> Result<Predicate> {
        match self {
            Filter::Fields(fields) => Ok(Predicate::from_columns(fields.resolve()?)),
            Filter::Raw(expr) => Ok(Predicate {
                sql: format!("({})", expr),
                params: Vec::new(),
            }),
            Filter::Unsupported(shape) => Err(AdapterError::InvalidFilterType(shape.clone())),
        }
    }
}

impl From<FieldFilter> for Filter {
    fn from(filter: FieldFilter) -> Self {
        Filter::Fields(filter)
    }
}

impl From<&str> for Filter {
    fn from(expr: &str) -> Self {
        Filter::Raw(expr.to_string())
    }
}

impl From<String> for Filter {
    fn from(expr: String) -> Self {
        Filter::Raw(expr)
    }
}

impl From<&Value> for Filter {
    fn from(input: &Value) -> Self {
        Filter::parse(input)
    }
}

/// A WHERE clause with its positional parameters
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Predicate {
    /// Empty when the clause does not restrict rows
    pub sql: String,
    pub params: Vec<String>,
}

impl Predicate {
    pub fn from_columns<V: AsRef<str>>(columns: Vec<(Column, V)>) -> Self {
        let mut clauses = Vec::with_capacity(columns.len());
        let mut params = Vec::with_capacity(columns.len());

        for (column, value) in columns {
            params.push(value.as_ref().to_string());
            clauses.push(format!("{} = ?{}", column.name(), params.len()));
        }

        Predicate {
            sql: clauses.join(" AND "),
            params,
        }
    }

    /// Append `column IS NULL OR column = ''` for each given column
    pub fn and_absent(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        for column in columns {
            let clause = format!("({0} IS NULL OR {0} = '')", column.name());
            if self.sql.is_empty() {
                self.sql = clause;
            } else {
                self.sql.push_str(" AND ");
                self.sql.push_str(&clause);
            }
        }
        self
    }

    /// ` WHERE ...` suffix, or an empty string for an unrestricted clause
    pub fn where_suffix(&self) -> String {
        if self.sql.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.sql)
        }
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_parse() {
        assert_eq!(Column::parse("ptype").unwrap(), Column::Ptype);
        assert_eq!(Column::parse("v0").unwrap(), Column::Value(0));
        assert_eq!(Column::parse("v5").unwrap(), Column::Value(5));
        assert!(Column::parse("v6").is_err());
        assert!(Column::parse("id").is_err());
        assert!(Column::parse("v0; DROP TABLE casbin_rule").is_err());
    }

    #[test]
    fn test_column_value_range() {
        assert_eq!(Column::value(3), Some(Column::Value(3)));
        assert_eq!(Column::value(6), None);
        assert_eq!(Column::Value(4).name(), "v4");
    }

    #[test]
    fn test_parallel_lists_pair_by_position() {
        let filter = FieldFilter::from_parallel(&["ptype", "v0"], &["p", "alice"]);
        let pairs: Vec<_> = filter.conditions().collect();

        assert_eq!(pairs, vec![("ptype", "p"), ("v0", "alice")]);
    }

    #[test]
    fn test_parse_string_is_raw() {
        let filter = Filter::parse(&json!("v0 = 'bob'"));
        assert_eq!(filter, Filter::Raw("v0 = 'bob'".to_string()));
    }

    #[test]
    fn test_parse_parallel_object() {
        let filter = Filter::parse(&json!({
            "fields": ["ptype", "v1"],
            "values": ["p", "data1"]
        }));

        let expected = FieldFilter::new().with("ptype", "p").with("v1", "data1");
        assert_eq!(filter, Filter::Fields(expected));
    }

    #[test]
    fn test_parse_column_map() {
        let filter = Filter::parse(&json!({"v0": "alice"}));
        assert_eq!(filter, Filter::Fields(FieldFilter::new().with("v0", "alice")));
    }

    #[test]
    fn test_parse_unsupported_shapes() {
        assert!(!Filter::parse(&json!(null)).is_supported());
        assert!(!Filter::parse(&json!(true)).is_supported());
        assert!(!Filter::parse(&json!(7)).is_supported());
        assert!(!Filter::parse(&json!(["v0", "alice"])).is_supported());
        assert!(!Filter::parse(&json!({"v0": 1})).is_supported());
        assert!(!Filter::parse(&json!({"fields": ["v0"], "values": []})).is_supported());
    }

    #[test]
    fn test_predicate_from_fields() {
        let filter = Filter::Fields(FieldFilter::new().with("ptype", "p").with("v2", "write"));
        let predicate = filter.to_predicate().unwrap();

        assert_eq!(predicate.sql, "ptype = ?1 AND v2 = ?2");
        assert_eq!(predicate.params, vec!["p", "write"]);
        assert_eq!(predicate.where_suffix(), " WHERE ptype = ?1 AND v2 = ?2");
    }

    #[test]
    fn test_empty_field_filter_is_unrestricted() {
        let predicate = Filter::Fields(FieldFilter::new()).to_predicate().unwrap();
        assert_eq!(predicate.where_suffix(), "");
    }

    #[test]
    fn test_predicate_rejects_unknown_column() {
        let filter = Filter::Fields(FieldFilter::new().with("v9", "x"));
        assert!(matches!(
            filter.to_predicate(),
            Err(AdapterError::InvalidFilterType(_))
        ));
    }

    #[test]
    fn test_predicate_rejects_unsupported() {
        let filter = Filter::Unsupported("number".to_string());
        assert!(matches!(
            filter.to_predicate(),
            Err(AdapterError::InvalidFilterType(_))
        ));
    }

    #[test]
    fn test_raw_predicate_is_wrapped() {
        let predicate = Filter::from("v0 = 'alice' OR v0 = 'bob'")
            .to_predicate()
            .unwrap();
        assert_eq!(predicate.sql, "(v0 = 'alice' OR v0 = 'bob')");
        assert!(predicate.params.is_empty());
    }

    #[test]
    fn test_and_absent() {
        let predicate = Predicate::from_columns(vec![(Column::Ptype, "p")])
            .and_absent([Column::Value(4), Column::Value(5)]);

        assert_eq!(
            predicate.sql,
            "ptype = ?1 AND (v4 IS NULL OR v4 = '') AND (v5 IS NULL OR v5 = '')"
        );
    }
}
