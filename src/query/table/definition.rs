//! Table and column metadata consumed by the builders.
//!
//! Schemas come from the model layer (usually a `once_cell` static per model)
//! and tell the builders which columns exist, which ones identify a row, and
//! which cast each column's values pass through.

use crate::value::CastType;

/// Column metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    /// Column name
    pub name: String,
    /// Cast applied when binding and hydrating this column
    pub cast: Option<CastType>,
    /// Whether the column is part of the primary key
    pub primary_key: bool,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cast: None,
            primary_key: false,
        }
    }

    #[must_use]
    pub fn cast(mut self, cast: CastType) -> Self {
        self.cast = Some(cast);
        self
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// Table metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_column(mut self, column: ColumnSchema) -> Self {
        self.columns.push(column);
        self
    }

    /// Look up a column by bare name
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    /// Cast declared for a column, accepting `table.column` for this table
    pub fn cast_for(&self, name: &str) -> Option<CastType> {
        let bare = match name.split_once('.') {
            Some((table, column)) if table == self.name => column,
            Some(_) => return None,
            None => name,
        };
        self.column(bare).and_then(|c| c.cast)
    }
}
