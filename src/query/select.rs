//! SELECT builders.
//!
//! [`Query`] selects rows of one model. Its state lives in [`SelectParts`],
//! which [`JointQuery`](super::JointQuery) shares, so both render `WHERE`,
//! `ORDER BY`, `LIMIT` and `OFFSET` the same way.

use crate::config::QueryConfig;
use crate::error::QueryError;
use crate::model::Model;
use crate::query::condition::{LogicalCondition, Operand, QueryCondition, SubQuery};
use crate::query::context::QueryContext;
use crate::query::expression::Expression;
use crate::query::filter::Filterable;
use crate::query::filter_service::{FilterMode, FilterPlan, FilterService, FirstResultLimit};
use crate::query::grammar::Grammar;
use crate::query::statement::QueryStatement;
use crate::query::table::TableSchema;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_sql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// What a SELECT projects
#[derive(Debug, Clone, Copy)]
pub(crate) enum Projection<'e> {
    /// The builder's selection
    Selection,
    /// Exactly one aggregate expression; ordering and paging are dropped
    Aggregate(&'e Expression),
}

/// Builder state shared by model and joint queries
pub(crate) struct SelectParts {
    pub(crate) selection: Vec<Expression>,
    pub(crate) selection_reset: bool,
    pub(crate) conditions: LogicalCondition,
    pub(crate) orders: Vec<(Expression, Order)>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) filter_service: Rc<dyn FilterService>,
    pub(crate) aggregate_alias: String,
}

impl SelectParts {
    pub(crate) fn new() -> Self {
        Self {
            selection: Vec::new(),
            selection_reset: false,
            conditions: LogicalCondition::default(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            filter_service: Rc::new(FirstResultLimit),
            aggregate_alias: QueryConfig::default().aggregate_alias,
        }
    }

    pub(crate) fn select<I, E>(&mut self, columns: I)
    where
        I: IntoIterator<Item = E>,
        E: Into<Expression>,
    {
        self.selection = columns.into_iter().map(Into::into).collect();
        self.selection_reset = true;
    }

    pub(crate) fn plan(&self, mode: FilterMode, schema: &TableSchema) -> Result<FilterPlan, QueryError> {
        self.filter_service.plan(mode, schema)
    }

    /// Builder conditions ANDed with the filter service's
    pub(crate) fn render_where(
        &self,
        ctx: &QueryContext<'_>,
        extra: &[QueryCondition],
    ) -> Result<QueryStatement, QueryError> {
        let mut stmt = self.conditions.finalize(ctx)?;
        if !stmt.is_empty() && !extra.is_empty() && self.conditions.is_compound() {
            stmt = stmt.wrapped();
        }
        for condition in extra {
            let mut rendered = condition.finalize(ctx)?;
            if condition.is_compound() {
                rendered = rendered.wrapped();
            }
            stmt.join(" AND ", rendered);
        }
        Ok(stmt)
    }

    /// `ORDER BY`, `LIMIT` and `OFFSET`
    fn render_tail(
        &self,
        ctx: &QueryContext<'_>,
        plan_limit: Option<u64>,
    ) -> Result<QueryStatement, QueryError> {
        let mut stmt = QueryStatement::new();

        let mut orders = QueryStatement::new();
        for (expression, order) in &self.orders {
            let mut rendered = expression.finalize(ctx)?;
            rendered.push_sql(" ").push_sql(order.as_sql());
            orders.join(", ", rendered);
        }
        if !orders.is_empty() {
            stmt.push_sql(" ORDER BY ").append(orders);
        }

        let limit = match (self.limit, plan_limit) {
            (Some(own), Some(planned)) => Some(own.min(planned)),
            (own, planned) => own.or(planned),
        };
        if let Some(limit) = limit {
            stmt.push_sql(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            stmt.push_sql(&format!(" OFFSET {offset}"));
        }
        Ok(stmt)
    }

    /// `SELECT <selection> FROM <from> [WHERE ...] [ORDER BY ...] [LIMIT n] [OFFSET m]`
    pub(crate) fn assemble(
        &self,
        ctx: &QueryContext<'_>,
        selection: QueryStatement,
        from: QueryStatement,
        plan: FilterPlan,
        projection: Projection<'_>,
    ) -> Result<QueryStatement, QueryError> {
        let mut stmt = QueryStatement::from_sql("SELECT ");
        stmt.append(selection).push_sql(" FROM ").append(from);

        let filter = self.render_where(ctx, &plan.conditions)?;
        if !filter.is_empty() {
            stmt.push_sql(" WHERE ").append(filter);
        }
        if let Projection::Selection = projection {
            stmt.append(self.render_tail(ctx, plan.limit)?);
        }
        Ok(stmt)
    }
}

impl fmt::Debug for SelectParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectParts")
            .field("selection", &self.selection)
            .field("selection_reset", &self.selection_reset)
            .field("conditions", &self.conditions)
            .field("orders", &self.orders)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("filter_service", &self.filter_service)
            .finish()
    }
}

/// Query builder for rows of model `M`
///
/// Returned by [`Model::query`] and chained with filters, selections, ordering
/// and paging. Nothing touches the database until an execution method such as
/// `list`, `first` or `count` is called.
///
/// # Example
///
/// ```no_run
/// use lifeguard_query::{Filterable, Model, MockConnection, Order};
/// # use lifeguard_query::{Attributes, QueryError, TableSchema};
/// # #[derive(Debug)] struct User;
/// # impl Model for User {
/// #     fn schema() -> &'static TableSchema { todo!() }
/// #     fn hydrate(_: Attributes) -> Result<Self, QueryError> { todo!() }
/// #     fn attributes(&self) -> Attributes { todo!() }
/// # }
/// # fn main() -> Result<(), QueryError> {
/// let conn = MockConnection::new();
/// let users = User::query()
///     .filter("name", "like", "John%")?
///     .order_by("id", Order::Asc)
///     .limit(10)
///     .list(&conn)?
///     .collect::<Result<Vec<_>, _>>()?;
/// # Ok(())
/// # }
/// ```
pub struct Query<M: Model> {
    pub(crate) parts: SelectParts,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Query<M> {
    pub fn new() -> Self {
        Self {
            parts: SelectParts::new(),
            _model: PhantomData,
        }
    }

    /// Apply configured aliases
    #[must_use]
    pub fn configure(mut self, config: &QueryConfig) -> Self {
        self.parts.aggregate_alias = config.aggregate_alias.clone();
        self
    }

    /// Replace the selection
    ///
    /// The query no longer selects every model column, so `list()` and
    /// `first()` refuse to run; use `records()` for custom selections.
    #[must_use]
    pub fn select<I, E>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expression>,
    {
        self.parts.select(columns);
        self
    }

    /// `select()` with no columns
    #[must_use]
    pub fn reset_selection(self) -> Self {
        self.select(Vec::<Expression>::new())
    }

    /// Select an extra expression alongside the current selection
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

    pub fn is_selection_reset(&self) -> bool {
        self.parts.selection_reset
    }

    pub fn conditions(&self) -> &LogicalCondition {
        &self.parts.conditions
    }

    /// Render the `list()` statement without a connection
    pub fn build(&self, grammar: &dyn Grammar) -> Result<QueryStatement, QueryError> {
        let mut ctx = QueryContext::new(grammar).with_schema(M::schema());
        self.render(&mut ctx, FilterMode::Apply, Projection::Selection)
    }

    fn render_selection(&self, ctx: &mut QueryContext<'_>) -> Result<QueryStatement, QueryError> {
        let mut extras = QueryStatement::new();
        for expression in &self.parts.selection {
            extras.join(", ", expression.finalize_selected(ctx)?);
        }
        if self.parts.selection_reset {
            if extras.is_empty() {
                return Ok(QueryStatement::from_sql("*"));
            }
            return Ok(extras);
        }

        if let Some(finalizer) = ctx.finalizer() {
            finalizer.mark_all_columns_selected();
        }
        if extras.is_empty() {
            return Ok(QueryStatement::from_sql("*"));
        }
        let table = ctx.grammar().quote_table(&M::schema().name);
        let mut stmt = QueryStatement::from_sql(format!("{table}.*"));
        stmt.join(", ", extras);
        Ok(stmt)
    }

    pub(crate) fn render(
        &self,
        ctx: &mut QueryContext<'_>,
        mode: FilterMode,
        projection: Projection<'_>,
    ) -> Result<QueryStatement, QueryError> {
        let schema = M::schema();
        let plan = self.parts.plan(mode, schema)?;
        let selection = match projection {
            Projection::Selection => self.render_selection(ctx)?,
            Projection::Aggregate(expression) => expression.finalize_selected(ctx)?,
        };
        let from = QueryStatement::from_sql(ctx.grammar().quote_table(&schema.name));
        self.parts.assemble(ctx, selection, from, plan, projection)
    }
}

impl<M: Model> Default for Query<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> fmt::Debug for Query<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("table", &M::schema().name)
            .field("parts", &self.parts)
            .finish()
    }
}

impl<M: Model> Filterable for Query<M> {
    fn conditions_mut(&mut self) -> &mut LogicalCondition {
        &mut self.parts.conditions
    }
}

impl<M: Model> SubQuery for Query<M> {
    fn finalize_subquery(&self, ctx: &QueryContext<'_>) -> Result<QueryStatement, QueryError> {
        let mut child = ctx.derive(M::schema());
        self.render(&mut child, FilterMode::None, Projection::Selection)
    }
}

impl<M: Model> From<Query<M>> for Operand {
    fn from(query: Query<M>) -> Self {
        Operand::Query(Box::new(query))
    }
}
