//! Filters applied to every SELECT a builder prepares.
//!
//! A filter service sees the mode a statement is prepared in and may add
//! conditions (tenancy, soft deletes) or a row limit to it.

use crate::error::QueryError;
use crate::query::condition::QueryCondition;
use crate::query::table::TableSchema;
use std::fmt;

/// Purpose a statement is being prepared for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Aggregates, sub-queries, and writes
    None,
    /// `list()` and `records()`
    Apply,
    /// `first()`
    First,
}

/// Additions a filter service makes to one statement
#[derive(Debug, Default)]
pub struct FilterPlan {
    /// ANDed onto the builder's own conditions
    pub conditions: Vec<QueryCondition>,
    /// Upper bound on returned rows
    pub limit: Option<u64>,
}

/// Service consulted while preparing statements
pub trait FilterService: fmt::Debug {
    fn plan(&self, mode: FilterMode, schema: &TableSchema) -> Result<FilterPlan, QueryError>;
}

/// Default service: `LIMIT 1` for `first()`
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstResultLimit;

impl FilterService for FirstResultLimit {
    fn plan(&self, mode: FilterMode, _schema: &TableSchema) -> Result<FilterPlan, QueryError> {
        Ok(FilterPlan {
            conditions: Vec::new(),
            limit: (mode == FilterMode::First).then_some(1),
        })
    }
}
