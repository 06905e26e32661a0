//! Multi-table joint queries.
//!
//! A joint query starts from a base model and joins further models in
//! registration order. Without an explicit selection every column of every
//! table is selected under a synthetic alias (`jc_1`, `jc_2`, ...) registered
//! with the [`JointFinalizer`](super::JointFinalizer), which splits each
//! result row back into one model per table.

use crate::config::QueryConfig;
use crate::error::QueryError;
use crate::model::Model;
use crate::query::condition::LogicalCondition;
use crate::query::context::QueryContext;
use crate::query::expression::{col, Expression};
use crate::query::filter::{ConditionScope, Filterable};
use crate::query::filter_service::{FilterMode, FilterService};
use crate::query::finalizer::JointTable;
use crate::query::grammar::Grammar;
use crate::query::select::{Order, Projection, SelectParts};
use crate::query::statement::QueryStatement;
use std::fmt;
use std::rc::Rc;

/// SQL join kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    /// Takes no `ON` clause
    Cross,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

#[derive(Debug)]
struct JoinClause {
    kind: JoinKind,
    on: LogicalCondition,
}

/// Query across a base model and the models joined to it
///
/// # Example
///
/// ```no_run
/// use lifeguard_query::{Filterable, JoinKind, JointQuery, MockConnection, QueryError};
/// # use lifeguard_query::{Attributes, Model, TableSchema};
/// # struct User; struct Post;
/// # impl Model for User {
/// #     fn schema() -> &'static TableSchema { todo!() }
/// #     fn hydrate(_: Attributes) -> Result<Self, QueryError> { todo!() }
/// #     fn attributes(&self) -> Attributes { todo!() }
/// # }
/// # impl Model for Post {
/// #     fn schema() -> &'static TableSchema { todo!() }
/// #     fn hydrate(_: Attributes) -> Result<Self, QueryError> { todo!() }
/// #     fn attributes(&self) -> Attributes { todo!() }
/// # }
/// # fn main() -> Result<(), QueryError> {
/// let conn = MockConnection::new();
/// let rows = JointQuery::new::<User>()
///     .join::<Post, _>(JoinKind::Left, |on| {
///         on.on("users.id", "=", lifeguard_query::col("posts.user_id"))
///     })?
///     .filter("users.active", "=", true)?
///     .list(&conn)?;
/// for record in rows {
///     let record = record?;
///     let user = record.get::<User>();
///     let post = record.get::<Post>();
/// }
/// # Ok(())
/// # }
/// ```
pub struct JointQuery {
    tables: Vec<JointTable>,
    joins: Vec<JoinClause>,
    parts: SelectParts,
    alias_prefix: String,
}

impl JointQuery {
    /// Start from base model `M`
    pub fn new<M: Model>() -> Self {
        Self {
            tables: vec![JointTable::of::<M>()],
            joins: Vec::new(),
            parts: SelectParts::new(),
            alias_prefix: QueryConfig::default().joint_alias_prefix,
        }
    }

    /// Apply configured aliases
    #[must_use]
    pub fn configure(mut self, config: &QueryConfig) -> Self {
        self.alias_prefix = config.joint_alias_prefix.clone();
        self.parts.aggregate_alias = config.aggregate_alias.clone();
        self
    }

    /// Join model `M`, populating the `ON` conditions through `on`
    ///
    /// `CROSS` joins render no `ON` clause; conditions given for one are
    /// dropped with a warning.
    pub fn join<M, F>(mut self, kind: JoinKind, on: F) -> Result<Self, QueryError>
    where
        M: Model,
        F: FnOnce(ConditionScope) -> Result<ConditionScope, QueryError>,
    {
        let on = on(ConditionScope::new())?.into_conditions();
        if kind == JoinKind::Cross && !on.is_empty() {
            log::warn!(
                "Ignoring ON conditions of CROSS JOIN {}",
                M::schema().name
            );
        }
        self.tables.push(JointTable::of::<M>());
        self.joins.push(JoinClause { kind, on });
        Ok(self)
    }

    pub fn inner_join<M, F>(self, on: F) -> Result<Self, QueryError>
    where
        M: Model,
        F: FnOnce(ConditionScope) -> Result<ConditionScope, QueryError>,
    {
        self.join::<M, F>(JoinKind::Inner, on)
    }

    pub fn left_join<M, F>(self, on: F) -> Result<Self, QueryError>
    where
        M: Model,
        F: FnOnce(ConditionScope) -> Result<ConditionScope, QueryError>,
    {
        self.join::<M, F>(JoinKind::Left, on)
    }

    #[must_use]
    pub fn cross_join<M: Model>(mut self) -> Self {
        self.tables.push(JointTable::of::<M>());
        self.joins.push(JoinClause {
            kind: JoinKind::Cross,
            on: LogicalCondition::default(),
        });
        self
    }

    /// Replace the selection
    ///
    /// Aliased `table.column` selections of joined tables are still routed to
    /// their table's model; anything else is not hydrated.
    #[must_use]
    pub fn select<I, E>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expression>,
    {
        self.parts.select(columns);
        self
    }

    #[must_use]
    pub fn add_select(mut self, expression: impl Into<Expression>) -> Self {
        self.parts.selection.push(expression.into());
        self
    }

    #[must_use]
    pub fn order_by(mut self, expression: impl Into<Expression>, order: Order) -> Self {
        self.parts.orders.push((expression.into(), order));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.parts.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.parts.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn with_filter_service(mut self, service: Rc<dyn FilterService>) -> Self {
        self.parts.filter_service = service;
        self
    }

    pub(crate) fn tables(&self) -> &[JointTable] {
        &self.tables
    }

    /// Add every participating schema to `ctx`
    pub(crate) fn context<'a>(&self, mut ctx: QueryContext<'a>) -> QueryContext<'a> {
        for table in &self.tables {
            ctx = ctx.with_schema(table.schema());
        }
        ctx
    }

    /// Render the `list()` statement without a connection
    pub fn build(&self, grammar: &dyn Grammar) -> Result<QueryStatement, QueryError> {
        let mut ctx = self.context(QueryContext::new(grammar));
        self.render(&mut ctx, FilterMode::Apply)
    }

    /// Table index and bare column of a `table.column` reference
    fn owner_of(&self, name: &str) -> Option<(usize, String)> {
        let (table, column) = name.split_once('.')?;
        let index = self
            .tables
            .iter()
            .position(|t| t.schema().name == table)?;
        self.tables[index]
            .schema()
            .column(column)
            .map(|c| (index, c.name.clone()))
    }

    fn render_selection(&self, ctx: &mut QueryContext<'_>) -> Result<QueryStatement, QueryError> {
        let mut stmt = QueryStatement::new();

        if !self.parts.selection_reset {
            let mut counter = 0usize;
            for (index, table) in self.tables.iter().enumerate() {
                let schema = table.schema();
                for column in &schema.columns {
                    counter += 1;
                    let alias = format!("{}{}", self.alias_prefix, counter);
                    if let Some(finalizer) = ctx.finalizer() {
                        finalizer.register_alias(&alias, index, &column.name);
                    }
                    let selected = col(format!("{}.{}", schema.name, column.name)).alias(&alias);
                    stmt.join(", ", selected.finalize_selected(ctx)?);
                }
            }
        }

        for expression in &self.parts.selection {
            if let (Some(alias), Some((index, column))) = (
                expression.output_name(),
                expression.column_name().and_then(|name| self.owner_of(name)),
            ) {
                if let Some(finalizer) = ctx.finalizer() {
                    finalizer.register_alias(alias, index, &column);
                }
            }
            stmt.join(", ", expression.finalize_selected(ctx)?);
        }

        if stmt.is_empty() {
            stmt.push_sql("*");
        }
        Ok(stmt)
    }

    fn render_from(&self, ctx: &QueryContext<'_>) -> Result<QueryStatement, QueryError> {
        let grammar = ctx.grammar();
        let mut stmt = QueryStatement::from_sql(grammar.quote_table(&self.tables[0].schema().name));
        for (table, join) in self.tables.iter().skip(1).zip(&self.joins) {
            stmt.push_sql(" ")
                .push_sql(join.kind.as_sql())
                .push_sql(" ")
                .push_sql(&grammar.quote_table(&table.schema().name));
            if join.kind == JoinKind::Cross {
                continue;
            }
            let on = join.on.finalize(ctx)?;
            if !on.is_empty() {
                stmt.push_sql(" ON ").append(on);
            }
        }
        Ok(stmt)
    }

    pub(crate) fn render(
        &self,
        ctx: &mut QueryContext<'_>,
        mode: FilterMode,
    ) -> Result<QueryStatement, QueryError> {
        let plan = self.parts.plan(mode, self.tables[0].schema())?;
        let selection = self.render_selection(ctx)?;
        let from = self.render_from(ctx)?;
        self.parts
            .assemble(ctx, selection, from, plan, Projection::Selection)
    }
}

impl Filterable for JointQuery {
    fn conditions_mut(&mut self) -> &mut LogicalCondition {
        &mut self.parts.conditions
    }
}

impl fmt::Debug for JointQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JointQuery")
            .field("tables", &self.tables)
            .field("joins", &self.joins)
            .field("parts", &self.parts)
            .field("alias_prefix", &self.alias_prefix)
            .finish()
    }
}
