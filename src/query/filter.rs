//! Fluent condition building.
//!
//! [`Filterable`] is implemented by every builder that owns a condition tree:
//! model queries, joint queries, nested condition scopes, and join `ON`
//! scopes. Nested scopes are opened with [`scoped`], which populates a fresh
//! [`ConditionScope`] through a closure and folds it into one logical node.

use crate::error::QueryError;
use crate::query::condition::{
    JoinType, LogicalCondition, Negation, Operand, Operator, QueryCondition, SpecificCondition,
};
use crate::query::expression::Expression;

fn comparison_target(column: Expression) -> Result<Expression, QueryError> {
    match &column {
        Expression::Column(name) if name.trim().is_empty() => {
            Err(QueryError::UnsupportedColumn("empty column name".to_string()))
        }
        Expression::Select { .. } => Err(QueryError::UnsupportedColumn(format!(
            "selection {column:?} cannot be compared"
        ))),
        _ => Ok(column),
    }
}

/// Leaf comparison from an operator token
pub fn comparison(
    join: JoinType,
    column: impl Into<Expression>,
    operator: &str,
    value: impl Into<Operand>,
) -> Result<QueryCondition, QueryError> {
    let operator: Operator = operator.parse()?;
    Ok(QueryCondition::Specific(SpecificCondition::new(
        join,
        comparison_target(column.into())?,
        operator,
        value.into(),
    )))
}

/// Leaf comparison from the two-argument form
///
/// A string value that is itself `=`, `<>` or `!=` is taken as the operator
/// of a NULL comparison; any other value is compared with implicit `=`.
pub fn implicit_comparison(
    join: JoinType,
    column: impl Into<Expression>,
    value: impl Into<Operand>,
) -> Result<QueryCondition, QueryError> {
    let value = value.into();
    let marker = match value.as_text().map(str::trim) {
        Some(token @ ("=" | "<>" | "!=")) => Some(token.parse::<Operator>()?),
        _ => None,
    };
    let (operator, value) = match marker {
        Some(operator) => (operator, Operand::Null),
        None => (Operator::Equal, value),
    };
    Ok(QueryCondition::Specific(SpecificCondition::new(
        join,
        comparison_target(column.into())?,
        operator,
        value,
    )))
}

/// Populate a nested scope and fold it into one logical node
///
/// ```rust
/// use lifeguard_query::query::{scoped, Filterable};
/// use lifeguard_query::JoinType;
///
/// let group = scoped(JoinType::Or, |scope| {
///     scope.filter("status", "=", "open")?.or_filter("status", "=", "pending")
/// })
/// .unwrap();
/// assert!(group.is_compound());
/// ```
pub fn scoped<F>(join: JoinType, populate: F) -> Result<QueryCondition, QueryError>
where
    F: FnOnce(ConditionScope) -> Result<ConditionScope, QueryError>,
{
    let scope = populate(ConditionScope::default())?;
    let mut logical = scope.conditions;
    logical.join = join;
    Ok(QueryCondition::Logical(logical))
}

/// Builders owning a condition tree
///
/// Methods returning `Result` parse an operator token or render a nested scope
/// and fail with the corresponding argument error; the rest cannot fail.
pub trait Filterable: Sized {
    /// Root of the condition tree
    fn conditions_mut(&mut self) -> &mut LogicalCondition;

    /// Append a prebuilt condition
    #[must_use]
    fn add_condition(mut self, condition: QueryCondition) -> Self {
        self.conditions_mut().push(condition);
        self
    }

    /// `AND <column> <operator> <value>`
    fn filter(
        self,
        column: impl Into<Expression>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Result<Self, QueryError> {
        Ok(self.add_condition(comparison(JoinType::And, column, operator, value)?))
    }

    /// `OR <column> <operator> <value>`
    fn or_filter(
        self,
        column: impl Into<Expression>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Result<Self, QueryError> {
        Ok(self.add_condition(comparison(JoinType::Or, column, operator, value)?))
    }

    /// `AND <column> <operator> <value>` with a typed operator
    #[must_use]
    fn filter_op(
        self,
        column: impl Into<Expression>,
        operator: Operator,
        value: impl Into<Operand>,
    ) -> Self {
        self.add_condition(QueryCondition::Specific(SpecificCondition::new(
            JoinType::And,
            column.into(),
            operator,
            value.into(),
        )))
    }

    /// Two-argument form, see [`implicit_comparison`]
    fn filter_eq(
        self,
        column: impl Into<Expression>,
        value: impl Into<Operand>,
    ) -> Result<Self, QueryError> {
        Ok(self.add_condition(implicit_comparison(JoinType::And, column, value)?))
    }

    fn or_filter_eq(
        self,
        column: impl Into<Expression>,
        value: impl Into<Operand>,
    ) -> Result<Self, QueryError> {
        Ok(self.add_condition(implicit_comparison(JoinType::Or, column, value)?))
    }

    /// `AND <column> IS NULL`
    #[must_use]
    fn filter_null(self, column: impl Into<Expression>) -> Self {
        self.filter_op(column, Operator::Equal, Operand::Null)
    }

    /// `AND <column> IS NOT NULL`
    #[must_use]
    fn filter_not_null(self, column: impl Into<Expression>) -> Self {
        self.filter_op(column, Operator::NotEqual, Operand::Null)
    }

    /// `AND (<nested conditions>)`
    fn filter_group<F>(self, populate: F) -> Result<Self, QueryError>
    where
        F: FnOnce(ConditionScope) -> Result<ConditionScope, QueryError>,
    {
        Ok(self.add_condition(scoped(JoinType::And, populate)?))
    }

    /// `OR (<nested conditions>)`
    fn or_filter_group<F>(self, populate: F) -> Result<Self, QueryError>
    where
        F: FnOnce(ConditionScope) -> Result<ConditionScope, QueryError>,
    {
        Ok(self.add_condition(scoped(JoinType::Or, populate)?))
    }

    /// `AND <column> <negated operator> <value>`
    fn filter_not(
        self,
        column: impl Into<Expression>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Result<Self, QueryError> {
        let positive = comparison(JoinType::And, column, operator, value)?;
        Ok(self.add_condition(Negation::FlipOperator.apply(positive)))
    }

    fn or_filter_not(
        self,
        column: impl Into<Expression>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Result<Self, QueryError> {
        let positive = comparison(JoinType::Or, column, operator, value)?;
        Ok(self.add_condition(Negation::FlipOperator.apply(positive)))
    }

    /// `AND NOT (<nested conditions>)`
    ///
    /// A scope holding a single comparison is negated by flipping its operator.
    fn filter_not_group<F>(self, populate: F) -> Result<Self, QueryError>
    where
        F: FnOnce(ConditionScope) -> Result<ConditionScope, QueryError>,
    {
        Ok(self.add_condition(negated_scope(JoinType::And, populate)?))
    }

    fn or_filter_not_group<F>(self, populate: F) -> Result<Self, QueryError>
    where
        F: FnOnce(ConditionScope) -> Result<ConditionScope, QueryError>,
    {
        Ok(self.add_condition(negated_scope(JoinType::Or, populate)?))
    }
}

fn negated_scope<F>(join: JoinType, populate: F) -> Result<QueryCondition, QueryError>
where
    F: FnOnce(ConditionScope) -> Result<ConditionScope, QueryError>,
{
    let scope = populate(ConditionScope::default())?;
    let mut logical = scope.conditions;
    logical.join = join;

    if logical.children.len() == 1 {
        match logical.children.pop() {
            Some(QueryCondition::Specific(mut specific)) => {
                specific.join = join;
                return Ok(Negation::FlipOperator.apply(QueryCondition::Specific(specific)));
            }
            // lone group: negate it directly instead of nesting parentheses
            Some(QueryCondition::Logical(mut inner)) => {
                inner.join = join;
                logical = inner;
            }
            Some(other) => logical.children.push(other),
            None => {}
        }
    }
    Ok(Negation::WrapNot.apply(QueryCondition::Logical(logical)))
}

/// Sub-builder for nested condition and join `ON` scopes
#[derive(Debug, Default)]
pub struct ConditionScope {
    conditions: LogicalCondition,
}

impl ConditionScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join condition, same rules as [`Filterable::filter`]
    pub fn on(
        self,
        column: impl Into<Expression>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Result<Self, QueryError> {
        self.filter(column, operator, value)
    }

    pub fn or_on(
        self,
        column: impl Into<Expression>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Result<Self, QueryError> {
        self.or_filter(column, operator, value)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn into_conditions(self) -> LogicalCondition {
        self.conditions
    }
}

impl Filterable for ConditionScope {
    fn conditions_mut(&mut self) -> &mut LogicalCondition {
        &mut self.conditions
    }
}
