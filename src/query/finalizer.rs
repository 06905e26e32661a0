//! Row-to-object hydration.
//!
//! A finalizer is attached to the [`QueryContext`](super::QueryContext) while a
//! SELECT is rendered, so the builder can tell it which casts apply and whether
//! every column of the model was selected. Once the statement runs, each raw
//! [`Row`] goes through [`ModelFinalizer::finalize`].

use crate::error::QueryError;
use crate::model::Model;
use crate::query::table::TableSchema;
use crate::value::{is_null, Attributes, Cast, CastType, DynamicRecord, Row};
use sea_query::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// Selection facts reported by the builder during rendering
pub trait SelectionTracker {
    /// The selection covers every column of the model
    fn mark_all_columns_selected(&mut self);

    fn all_columns_selected(&self) -> bool;

    /// Cast to apply to `column` (a column name or alias) when hydrating
    fn add_cast(&mut self, column: &str, cast: CastType);

    /// Route result alias `alias` to `column` of the `table`-th joined table
    fn register_alias(&mut self, alias: &str, table: usize, column: &str) {
        let _ = (alias, table, column);
    }
}

/// Converts raw rows into hydrated output
pub trait ModelFinalizer: SelectionTracker {
    type Output;

    fn finalize(&self, row: Row) -> Result<Self::Output, QueryError>;
}

fn apply_cast(cast: Option<CastType>, column: &str, raw: Value) -> Result<Value, QueryError> {
    match cast {
        Some(cast) => Ok(cast.from_db(column, raw)?),
        None => Ok(raw),
    }
}

/// Result of the default finalizer
#[derive(Debug, Clone, PartialEq)]
pub enum Hydrated<M> {
    /// Every model column was selected
    Model(M),
    /// Partial or custom selection
    Dynamic(DynamicRecord),
}

impl<M: Model> Hydrated<M> {
    /// The typed model
    ///
    /// # Errors
    ///
    /// Returns `QueryError::PartialSelection` for dynamic rows.
    pub fn into_model(self) -> Result<M, QueryError> {
        match self {
            Hydrated::Model(model) => Ok(model),
            Hydrated::Dynamic(_) => Err(QueryError::PartialSelection),
        }
    }

    /// The row as a dynamic record, whatever its shape
    pub fn into_record(self) -> DynamicRecord {
        match self {
            Hydrated::Model(model) => DynamicRecord::new(model.attributes()),
            Hydrated::Dynamic(record) => record,
        }
    }
}

/// Single-table finalizer hydrating `M`
pub struct DefaultFinalizer<M> {
    all_columns_selected: bool,
    casts: HashMap<String, CastType>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> DefaultFinalizer<M> {
    pub fn new() -> Self {
        Self {
            all_columns_selected: false,
            casts: HashMap::new(),
            _model: PhantomData,
        }
    }

    pub fn casts(&self) -> &HashMap<String, CastType> {
        &self.casts
    }
}

impl<M: Model> Default for DefaultFinalizer<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for DefaultFinalizer<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultFinalizer")
            .field("all_columns_selected", &self.all_columns_selected)
            .field("casts", &self.casts)
            .finish()
    }
}

impl<M: Model> SelectionTracker for DefaultFinalizer<M> {
    fn mark_all_columns_selected(&mut self) {
        self.all_columns_selected = true;
    }

    fn all_columns_selected(&self) -> bool {
        self.all_columns_selected
    }

    fn add_cast(&mut self, column: &str, cast: CastType) {
        self.casts.insert(column.to_string(), cast);
    }
}

impl<M: Model> ModelFinalizer for DefaultFinalizer<M> {
    type Output = Hydrated<M>;

    fn finalize(&self, row: Row) -> Result<Hydrated<M>, QueryError> {
        let schema = M::schema();
        let mut attributes = Attributes::new();
        for (column, raw) in row {
            let registered = self.casts.get(&column).copied();
            // dynamic rows only carry casts the selection asked for
            let cast = if self.all_columns_selected {
                registered.or_else(|| schema.cast_for(&column))
            } else {
                registered
            };
            let value = apply_cast(cast, &column, raw)?;
            attributes.set_attribute(column, value);
        }

        if self.all_columns_selected {
            M::hydrate(attributes).map(Hydrated::Model)
        } else {
            Ok(Hydrated::Dynamic(DynamicRecord::new(attributes)))
        }
    }
}

type Build = fn(Attributes) -> Result<Box<dyn Any>, QueryError>;

fn build_model<M: Model>(attributes: Attributes) -> Result<Box<dyn Any>, QueryError> {
    M::hydrate(attributes).map(|model| Box::new(model) as Box<dyn Any>)
}

/// One table taking part in a joint query
#[derive(Clone, Copy)]
pub struct JointTable {
    schema: &'static TableSchema,
    type_id: TypeId,
    build: Build,
}

impl JointTable {
    pub fn of<M: Model>() -> Self {
        Self {
            schema: M::schema(),
            type_id: TypeId::of::<M>(),
            build: build_model::<M>,
        }
    }

    pub fn schema(&self) -> &'static TableSchema {
        self.schema
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl fmt::Debug for JointTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JointTable")
            .field("table", &self.schema.name)
            .finish()
    }
}

#[derive(Debug, Clone)]
struct AliasTarget {
    table: usize,
    column: String,
}

/// Multi-table finalizer splitting aliased rows back into per-table models
#[derive(Debug)]
pub struct JointFinalizer {
    tables: Vec<JointTable>,
    aliases: HashMap<String, AliasTarget>,
    casts: HashMap<String, CastType>,
}

impl JointFinalizer {
    pub fn new(tables: Vec<JointTable>) -> Self {
        Self {
            tables,
            aliases: HashMap::new(),
            casts: HashMap::new(),
        }
    }

    /// Registered aliases as `(alias, table index, column)`
    pub fn aliases(&self) -> impl Iterator<Item = (&str, usize, &str)> {
        self.aliases
            .iter()
            .map(|(alias, target)| (alias.as_str(), target.table, target.column.as_str()))
    }
}

impl SelectionTracker for JointFinalizer {
    fn mark_all_columns_selected(&mut self) {}

    // Joint rows are always split into full per-table models
    fn all_columns_selected(&self) -> bool {
        true
    }

    fn add_cast(&mut self, column: &str, cast: CastType) {
        self.casts.insert(column.to_string(), cast);
    }

    fn register_alias(&mut self, alias: &str, table: usize, column: &str) {
        if table < self.tables.len() {
            self.aliases.insert(
                alias.to_string(),
                AliasTarget {
                    table,
                    column: column.to_string(),
                },
            );
        }
    }
}

impl ModelFinalizer for JointFinalizer {
    type Output = JointRecord;

    fn finalize(&self, row: Row) -> Result<JointRecord, QueryError> {
        let mut buffers = vec![Attributes::new(); self.tables.len()];
        for (alias, raw) in row {
            let Some(target) = self.aliases.get(&alias) else {
                continue;
            };
            let cast = self
                .casts
                .get(&alias)
                .copied()
                .or_else(|| self.tables[target.table].schema.cast_for(&target.column));
            let value = apply_cast(cast, &target.column, raw)?;
            buffers[target.table].set_attribute(target.column.clone(), value);
        }

        let mut record = JointRecord::default();
        for (table, attributes) in self.tables.iter().zip(buffers) {
            // outer joins yield all-NULL columns for unmatched tables
            if attributes.iter().all(|(_, value)| is_null(value)) {
                continue;
            }
            let model = (table.build)(attributes)?;
            record.models.insert(table.type_id, model);
        }
        Ok(record)
    }
}

/// One joint result row: a model instance per matched table, keyed by type
#[derive(Default)]
pub struct JointRecord {
    models: HashMap<TypeId, Box<dyn Any>>,
}

impl JointRecord {
    pub fn get<M: Model>(&self) -> Option<&M> {
        self.models
            .get(&TypeId::of::<M>())
            .and_then(|model| model.downcast_ref::<M>())
    }

    pub fn take<M: Model>(&mut self) -> Option<M> {
        let model = self.models.remove(&TypeId::of::<M>())?;
        model.downcast::<M>().ok().map(|model| *model)
    }

    pub fn contains<M: Model>(&self) -> bool {
        self.models.contains_key(&TypeId::of::<M>())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl fmt::Debug for JointRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JointRecord")
            .field("models", &self.models.len())
            .finish()
    }
}
