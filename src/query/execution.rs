//! Query execution methods for `Query` and `JointQuery`.
//!
//! Reads prepare a statement with a fresh finalizer attached to the context
//! and return a lazy [`Rows`] sequence that hydrates each row as it is pulled.
//! Writes render and execute directly.

use crate::error::QueryError;
use crate::executor::{Connection, RowIter};
use crate::model::Model;
use crate::query::condition::Operand;
use crate::query::context::QueryContext;
use crate::query::expression::{raw, Expression};
use crate::query::filter_service::FilterMode;
use crate::query::finalizer::{DefaultFinalizer, Hydrated, JointFinalizer, JointRecord, ModelFinalizer};
use crate::query::joint::JointQuery;
use crate::query::select::{Projection, Query};
use crate::query::statement::QueryStatement;
use crate::raw_sql;
use crate::value::{Cast, CastType, DynamicRecord, TryGetable};
use sea_query::Value;

/// Lazy sequence of finalized rows
///
/// Single pass: iterating again requires a new `list()` call.
pub struct Rows<'c, F: ModelFinalizer> {
    rows: RowIter<'c>,
    finalizer: F,
}

impl<'c, F: ModelFinalizer> Rows<'c, F> {
    pub(crate) fn new(rows: RowIter<'c>, finalizer: F) -> Self {
        Self { rows, finalizer }
    }

    pub fn finalizer(&self) -> &F {
        &self.finalizer
    }
}

impl<F: ModelFinalizer> Iterator for Rows<'_, F> {
    type Item = Result<F::Output, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(
            row.map_err(QueryError::Driver)
                .and_then(|row| self.finalizer.finalize(row)),
        )
    }
}

/// Lazy sequence of hydrated models
pub struct ModelRows<'c, M: Model> {
    inner: Rows<'c, DefaultFinalizer<M>>,
}

impl<M: Model> Iterator for ModelRows<'_, M> {
    type Item = Result<M, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|hydrated| hydrated.and_then(Hydrated::into_model))
    }
}

/// Lazy sequence of dynamic records
pub struct RecordRows<'c, M: Model> {
    inner: Rows<'c, DefaultFinalizer<M>>,
}

impl<M: Model> Iterator for RecordRows<'_, M> {
    type Item = Result<DynamicRecord, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|hydrated| hydrated.map(Hydrated::into_record))
    }
}

impl<M: Model> Query<M> {
    fn fetch<'c>(
        &self,
        connection: &'c dyn Connection,
        mode: FilterMode,
    ) -> Result<Rows<'c, DefaultFinalizer<M>>, QueryError> {
        let mut finalizer = DefaultFinalizer::<M>::new();
        let statement = {
            let mut ctx = QueryContext::for_connection(connection)
                .with_schema(M::schema())
                .with_finalizer(&mut finalizer);
            self.render(&mut ctx, mode, Projection::Selection)?
        };
        let rows = raw_sql::query(connection, &statement)?;
        Ok(Rows::new(rows, finalizer))
    }

    /// Execute the query and return its rows as models
    ///
    /// # Errors
    ///
    /// Returns `QueryError::SelectionReset` if `select()` replaced the
    /// selection; use [`records`](Self::records) for custom selections.
    pub fn list<'c>(&self, connection: &'c dyn Connection) -> Result<ModelRows<'c, M>, QueryError> {
        if self.is_selection_reset() {
            return Err(QueryError::SelectionReset);
        }
        Ok(ModelRows {
            inner: self.fetch(connection, FilterMode::Apply)?,
        })
    }

    /// Execute the query and return its first row as a model
    pub fn first(&self, connection: &dyn Connection) -> Result<Option<M>, QueryError> {
        if self.is_selection_reset() {
            return Err(QueryError::SelectionReset);
        }
        let mut rows = ModelRows {
            inner: self.fetch(connection, FilterMode::First)?,
        };
        rows.next().transpose()
    }

    /// Execute the query and return its rows as dynamic records
    ///
    /// Works with any selection, including a reset one.
    pub fn records<'c>(
        &self,
        connection: &'c dyn Connection,
    ) -> Result<RecordRows<'c, M>, QueryError> {
        Ok(RecordRows {
            inner: self.fetch(connection, FilterMode::Apply)?,
        })
    }

    /// Select exactly `expression` and return its single value
    ///
    /// The selection, ordering and paging of the builder are ignored; its
    /// conditions apply. With no result row the NULL of the cast (or an
    /// untyped NULL) is returned.
    pub fn aggregate(
        &self,
        connection: &dyn Connection,
        expression: impl Into<Expression>,
        cast: Option<CastType>,
    ) -> Result<Value, QueryError> {
        let alias = self.parts.aggregate_alias.as_str();
        let projection = expression.into().select(Some(alias), cast);
        let statement = {
            let mut ctx = QueryContext::for_connection(connection).with_schema(M::schema());
            self.render(&mut ctx, FilterMode::None, Projection::Aggregate(&projection))?
        };

        let raw_value = raw_sql::query_one(connection, &statement)?
            .and_then(|row| row.get(alias).cloned())
            .unwrap_or(Value::BigInt(None));
        match cast {
            Some(cast) => Ok(cast.from_db(alias, raw_value)?),
            None => Ok(raw_value),
        }
    }

    /// `COUNT(*)` over the matching rows
    pub fn count(&self, connection: &dyn Connection) -> Result<i64, QueryError> {
        let value = self.aggregate(
            connection,
            Expression::count(raw("*")),
            Some(CastType::BigInteger),
        )?;
        Option::<i64>::try_get(value)
            .map(|count| count.unwrap_or(0))
            .map_err(|e| QueryError::Hydration(format!("count: {e}")))
    }

    pub fn sum(
        &self,
        connection: &dyn Connection,
        column: impl Into<Expression>,
    ) -> Result<Value, QueryError> {
        self.aggregate(connection, Expression::sum(column), None)
    }

    pub fn avg(
        &self,
        connection: &dyn Connection,
        column: impl Into<Expression>,
    ) -> Result<Value, QueryError> {
        self.aggregate(connection, Expression::avg(column), Some(CastType::Float))
    }

    pub fn min(
        &self,
        connection: &dyn Connection,
        column: impl Into<Expression>,
    ) -> Result<Value, QueryError> {
        self.aggregate(connection, Expression::min(column), None)
    }

    pub fn max(
        &self,
        connection: &dyn Connection,
        column: impl Into<Expression>,
    ) -> Result<Value, QueryError> {
        self.aggregate(connection, Expression::max(column), None)
    }

    /// Render `UPDATE <table> SET ... [WHERE ...]`
    pub fn build_update<I, K, V>(
        &self,
        ctx: &QueryContext<'_>,
        assignments: I,
    ) -> Result<QueryStatement, QueryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Operand>,
    {
        let schema = M::schema();
        let grammar = ctx.grammar();
        let mut set = QueryStatement::new();
        for (column, value) in assignments {
            let column = column.into();
            let mut part = QueryStatement::from_sql(format!("{} = ", grammar.quote_column(&column)));
            match value.into() {
                Operand::Null => {
                    part.push_sql("NULL");
                }
                Operand::Value(value) => {
                    let value = match ctx.cast_for(&column) {
                        Some(cast) => cast.to_db(value)?,
                        None => value,
                    };
                    part.push_value(value);
                }
                Operand::Expression(expression) => {
                    part.append(expression.finalize(ctx)?);
                }
                Operand::List(_) | Operand::Query(_) => {
                    return Err(QueryError::UnsupportedValue {
                        operator: "=".to_string(),
                        reason: format!("column {column} cannot be assigned a list or subquery"),
                    });
                }
            }
            set.join(", ", part);
        }

        let mut statement =
            QueryStatement::from_sql(format!("UPDATE {} SET ", grammar.quote_table(&schema.name)));
        statement.append(set);
        self.append_where(ctx, &mut statement)?;
        Ok(statement)
    }

    /// Render `DELETE FROM <table> [WHERE ...]`
    pub fn build_delete(&self, ctx: &QueryContext<'_>) -> Result<QueryStatement, QueryError> {
        let mut statement = QueryStatement::from_sql(format!(
            "DELETE FROM {}",
            ctx.grammar().quote_table(&M::schema().name)
        ));
        self.append_where(ctx, &mut statement)?;
        Ok(statement)
    }

    fn append_where(
        &self,
        ctx: &QueryContext<'_>,
        statement: &mut QueryStatement,
    ) -> Result<(), QueryError> {
        let plan = self.parts.plan(FilterMode::None, M::schema())?;
        let filter = self.parts.render_where(ctx, &plan.conditions)?;
        if !filter.is_empty() {
            statement.push_sql(" WHERE ").append(filter);
        }
        Ok(())
    }

    /// Update the matching rows; returns the number of affected rows
    ///
    /// With no assignments nothing is executed.
    pub fn update<I, K, V>(&self, connection: &dyn Connection, assignments: I) -> Result<u64, QueryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Operand>,
    {
        let mut assignments = assignments.into_iter().peekable();
        if assignments.peek().is_none() {
            log::debug!("Skipping UPDATE of {} with no assignments", M::schema().name);
            return Ok(0);
        }
        let statement = {
            let ctx = QueryContext::for_connection(connection).with_schema(M::schema());
            self.build_update(&ctx, assignments)?
        };
        raw_sql::execute(connection, &statement)
    }

    /// Delete the matching rows; returns the number of affected rows
    pub fn delete(&self, connection: &dyn Connection) -> Result<u64, QueryError> {
        let statement = {
            let ctx = QueryContext::for_connection(connection).with_schema(M::schema());
            self.build_delete(&ctx)?
        };
        raw_sql::execute(connection, &statement)
    }

    /// `TRUNCATE TABLE <table>`
    pub fn truncate(&self, connection: &dyn Connection) -> Result<u64, QueryError> {
        let table = connection.grammar().quote_table(&M::schema().name);
        raw_sql::execute_unprepared(connection, &format!("TRUNCATE TABLE {table}"))
    }
}

impl JointQuery {
    fn fetch<'c>(
        &self,
        connection: &'c dyn Connection,
        mode: FilterMode,
    ) -> Result<Rows<'c, JointFinalizer>, QueryError> {
        let mut finalizer = JointFinalizer::new(self.tables().to_vec());
        let statement = {
            let mut ctx = self
                .context(QueryContext::for_connection(connection))
                .with_finalizer(&mut finalizer);
            self.render(&mut ctx, mode)?
        };
        let rows = raw_sql::query(connection, &statement)?;
        Ok(Rows::new(rows, finalizer))
    }

    /// Execute the query and split each row into per-table models
    pub fn list<'c>(
        &self,
        connection: &'c dyn Connection,
    ) -> Result<Rows<'c, JointFinalizer>, QueryError> {
        self.fetch(connection, FilterMode::Apply)
    }

    pub fn first(&self, connection: &dyn Connection) -> Result<Option<JointRecord>, QueryError> {
        self.fetch(connection, FilterMode::First)?.next().transpose()
    }
}
