//! # Rule Table Adapter - SQLite Storage for Access-Control Policies
//!
//! `rule-table-adapter` persists policy rules in a relational table and loads
//! them back into an in-memory policy model. Each rule is a `ptype` tag plus up
//! to six positional values stored in the columns `v0`..`v5`:
//!
//! | ptype | v0    | v1          | v2   | v3..v5 |
//! |-------|-------|-------------|------|--------|
//! | p     | alice | data1       | read | NULL   |
//! | g     | alice | data2_admin | NULL | NULL   |
//!
//! - **Full and filtered loads** with a flag recording whether the last load was partial
//! - **Atomic batches**: multi-rule inserts, deletes and updates run in one transaction
//! - **Auto-save hooks** through the [`Adapter`] trait
//!
//! ## Quick Start
//!
//! ```rust
//! use rule_table_adapter::{Adapter, MemoryModel, Result, SqliteAdapter};
//!
//! # fn main() -> Result<()> {
//! let mut adapter = SqliteAdapter::open_in_memory()?;
//!
//! adapter.insert_one("p", &["alice", "data1", "read"])?;
//! adapter.insert_one("g", &["alice", "data2_admin"])?;
//!
//! let mut model = MemoryModel::new();
//! adapter.load_policy(&mut model)?;
//! assert!(model.has_policy("p", "p", &["alice", "data1", "read"]));
//! assert!(!adapter.is_filtered());
//! # Ok(())
//! # }
//! ```
//!
//! ## Filtered Loads
//!
//! ```rust
//! use rule_table_adapter::{FieldFilter, Filter, Result, SqliteAdapter};
//!
//! # fn main() -> Result<()> {
//! let mut adapter = SqliteAdapter::open_in_memory()?;
//! adapter.insert_many("p", &[["alice", "data1", "read"], ["bob", "data2", "write"]])?;
//!
//! let filter = Filter::from(FieldFilter::new().with("v0", "bob"));
//! let rules = adapter.load_filtered(&filter)?;
//! assert_eq!(rules.len(), 1);
//! assert!(adapter.is_filtered());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod core;
pub mod error;

pub use crate::adapter::{Adapter, SqliteAdapter};
pub use crate::config::{AdapterConfig, Driver};
pub use crate::core::{
    codec::{Rule, StoredRow, MAX_ARITY},
    filter::{Column, FieldFilter, Filter},
    model::{MemoryModel, Model},
    validation::{TableName, DEFAULT_TABLE_NAME},
};
pub use crate::error::{AdapterError, Result};
