//! Per-build rendering context.
//!
//! A context carries everything rendering needs beyond the builder itself: the
//! connection being targeted (if any), its grammar, the schemas whose columns
//! may appear in the statement, and the finalizer collecting selection facts.

use crate::executor::Connection;
use crate::query::finalizer::SelectionTracker;
use crate::query::grammar::{Grammar, DEFAULT_GRAMMAR};
use crate::query::table::{ColumnSchema, TableSchema};
use crate::value::CastType;

/// Rendering context for one statement build
pub struct QueryContext<'a> {
    connection: Option<&'a dyn Connection>,
    grammar: &'a dyn Grammar,
    schemas: Vec<&'a TableSchema>,
    finalizer: Option<&'a mut dyn SelectionTracker>,
}

impl<'a> QueryContext<'a> {
    /// Context without a connection, rendering with `grammar`
    pub fn new(grammar: &'a dyn Grammar) -> Self {
        Self {
            connection: None,
            grammar,
            schemas: Vec::new(),
            finalizer: None,
        }
    }

    /// Context targeting `connection`, rendering with its grammar
    pub fn for_connection(connection: &'a dyn Connection) -> Self {
        Self {
            connection: Some(connection),
            grammar: connection.grammar(),
            schemas: Vec::new(),
            finalizer: None,
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: &'a TableSchema) -> Self {
        self.schemas.push(schema);
        self
    }

    #[must_use]
    pub fn with_finalizer(mut self, finalizer: &'a mut dyn SelectionTracker) -> Self {
        self.finalizer = Some(finalizer);
        self
    }

    pub fn connection(&self) -> Option<&'a dyn Connection> {
        self.connection
    }

    pub fn grammar(&self) -> &'a dyn Grammar {
        self.grammar
    }

    /// Schema of the base table
    pub fn table_schema(&self) -> Option<&'a TableSchema> {
        self.schemas.first().copied()
    }

    pub fn schemas(&self) -> &[&'a TableSchema] {
        &self.schemas
    }

    /// Resolve `table.column` or a bare column against the known schemas
    ///
    /// A bare name resolves to the first schema declaring it.
    pub fn resolve_column(&self, name: &str) -> Option<&'a ColumnSchema> {
        match name.split_once('.') {
            Some((table, column)) => self
                .schemas
                .iter()
                .find(|schema| schema.name == table)
                .and_then(|schema| schema.column(column)),
            None => self.schemas.iter().find_map(|schema| schema.column(name)),
        }
    }

    pub fn cast_for(&self, name: &str) -> Option<CastType> {
        self.resolve_column(name).and_then(|column| column.cast)
    }

    /// The finalizer collecting selection facts, if one is attached
    pub fn finalizer(&mut self) -> Option<&mut (dyn SelectionTracker + 'a)> {
        self.finalizer.as_deref_mut()
    }

    /// Child context for a nested statement
    ///
    /// The child shares the connection and grammar but sees only `schema` and
    /// never reports selections to this context's finalizer.
    pub fn derive<'b>(&'b self, schema: &'b TableSchema) -> QueryContext<'b> {
        QueryContext {
            connection: self.connection,
            grammar: self.grammar,
            schemas: vec![schema],
            finalizer: None,
        }
    }
}

impl Default for QueryContext<'_> {
    fn default() -> Self {
        Self::new(&DEFAULT_GRAMMAR)
    }
}

impl std::fmt::Debug for QueryContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryContext")
            .field("connection", &self.connection.map(|c| c.id()))
            .field(
                "schemas",
                &self.schemas.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            )
            .field("has_finalizer", &self.finalizer.is_some())
            .finish()
    }
}
