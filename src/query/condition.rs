//! Condition tree.
//!
//! `WHERE` and `ON` clauses are trees of [`QueryCondition`] nodes: leaf
//! comparisons, logical groups, and negations. Each node carries the keyword
//! joining it to its preceding sibling.

use crate::error::QueryError;
use crate::query::context::QueryContext;
use crate::query::expression::Expression;
use crate::query::statement::QueryStatement;
use crate::value::{is_null, Cast};
use sea_query::Value;
use std::fmt;
use std::str::FromStr;

/// Keyword joining a condition to the one before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    #[default]
    And,
    Or,
}

impl JoinType {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinType::And => "AND",
            JoinType::Or => "OR",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Like,
    NotLike,
    In,
    NotIn,
}

impl Operator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
        }
    }

    /// The operator matching exactly the rows this one rejects
    pub fn negate(self) -> Self {
        match self {
            Operator::Equal => Operator::NotEqual,
            Operator::NotEqual => Operator::Equal,
            Operator::LessThan => Operator::GreaterThanOrEqual,
            Operator::GreaterThanOrEqual => Operator::LessThan,
            Operator::LessThanOrEqual => Operator::GreaterThan,
            Operator::GreaterThan => Operator::LessThanOrEqual,
            Operator::Like => Operator::NotLike,
            Operator::NotLike => Operator::Like,
            Operator::In => Operator::NotIn,
            Operator::NotIn => Operator::In,
        }
    }

    pub fn is_membership(self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let normalized = token.trim().to_ascii_lowercase();
        let operator = match normalized.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
            "=" | "==" => Operator::Equal,
            "<>" | "!=" => Operator::NotEqual,
            "<" => Operator::LessThan,
            "<=" | "=<" => Operator::LessThanOrEqual,
            ">" => Operator::GreaterThan,
            ">=" | "=>" => Operator::GreaterThanOrEqual,
            "like" => Operator::Like,
            "not like" => Operator::NotLike,
            "in" => Operator::In,
            "not in" => Operator::NotIn,
            _ => return Err(QueryError::UnsupportedOperator(token.to_string())),
        };
        Ok(operator)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A statement that can be embedded as an `IN (...)` operand
pub trait SubQuery: fmt::Debug {
    /// Render against a child of `ctx`
    fn finalize_subquery(&self, ctx: &QueryContext<'_>) -> Result<QueryStatement, QueryError>;
}

/// Right-hand side of a comparison
#[derive(Debug)]
pub enum Operand {
    Null,
    Value(Value),
    List(Vec<Value>),
    /// Rendered inline, e.g. the other column of a join condition
    Expression(Expression),
    Query(Box<dyn SubQuery>),
}

impl Operand {
    pub fn is_null(&self) -> bool {
        matches!(self, Operand::Null)
    }

    /// Literal text of a string scalar
    pub(crate) fn as_text(&self) -> Option<&str> {
        match self {
            Operand::Value(Value::String(Some(s))) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        if is_null(&value) {
            Operand::Null
        } else {
            Operand::Value(value)
        }
    }
}

macro_rules! scalar_operand {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Operand::from(Value::from(value))
                }
            }

            impl From<Option<$ty>> for Operand {
                fn from(value: Option<$ty>) -> Self {
                    match value {
                        Some(value) => Operand::from(value),
                        None => Operand::Null,
                    }
                }
            }
        )*
    };
}

scalar_operand!(i32, i64, u32, f64, bool, String, &str);

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(values: Vec<T>) -> Self {
        Operand::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<Expression> for Operand {
    fn from(expression: Expression) -> Self {
        Operand::Expression(expression)
    }
}

impl From<()> for Operand {
    fn from(_: ()) -> Self {
        Operand::Null
    }
}

/// Leaf comparison `<column> <operator> <value>`
#[derive(Debug)]
pub struct SpecificCondition {
    pub join: JoinType,
    pub column: Expression,
    pub operator: Operator,
    pub value: Operand,
}

impl SpecificCondition {
    pub fn new(join: JoinType, column: Expression, operator: Operator, value: Operand) -> Self {
        Self {
            join,
            column,
            operator,
            value,
        }
    }

    fn unsupported(&self, reason: &str) -> QueryError {
        QueryError::UnsupportedValue {
            operator: self.operator.as_sql().to_string(),
            reason: reason.to_string(),
        }
    }

    fn cast_value(&self, ctx: &QueryContext<'_>, value: &Value) -> Result<Value, QueryError> {
        let cast = self.column.column_name().and_then(|name| ctx.cast_for(name));
        match cast {
            Some(cast) => Ok(cast.to_db(value.clone())?),
            None => Ok(value.clone()),
        }
    }

    pub fn finalize(&self, ctx: &QueryContext<'_>) -> Result<QueryStatement, QueryError> {
        let operator = self.operator;
        let mut stmt = self.column.finalize(ctx)?;
        stmt.push_sql(" ");

        match &self.value {
            Operand::Null => match operator {
                Operator::Equal => {
                    stmt.push_sql("IS NULL");
                }
                Operator::NotEqual => {
                    stmt.push_sql("IS NOT NULL");
                }
                Operator::In | Operator::NotIn => {
                    return Err(self.unsupported("NULL cannot be a membership operand"));
                }
                // kept literal; evaluates to unknown in SQL
                _ => {
                    stmt.push_sql(operator.as_sql()).push_sql(" NULL");
                }
            },
            Operand::Query(query) => {
                if !operator.is_membership() {
                    return Err(self.unsupported("a subquery operand requires IN or NOT IN"));
                }
                stmt.push_sql(operator.as_sql()).push_sql(" (");
                stmt.append(query.finalize_subquery(ctx)?).push_sql(")");
            }
            Operand::List(values) => {
                if !operator.is_membership() {
                    return Err(self.unsupported("a list operand requires IN or NOT IN"));
                }
                if values.is_empty() {
                    return Err(self.unsupported("the value list is empty"));
                }
                let values = values
                    .iter()
                    .map(|value| self.cast_value(ctx, value))
                    .collect::<Result<Vec<_>, _>>()?;
                stmt.push_sql(operator.as_sql()).push_sql(" (");
                stmt.push_values(values).push_sql(")");
            }
            Operand::Expression(expression) => {
                let rendered = expression.finalize(ctx)?;
                stmt.push_sql(operator.as_sql()).push_sql(" ");
                if operator.is_membership() {
                    stmt.append(rendered.wrapped());
                } else {
                    stmt.append(rendered);
                }
            }
            Operand::Value(value) => {
                if operator.is_membership() {
                    return Err(self.unsupported("IN and NOT IN require a list or subquery"));
                }
                let value = self.cast_value(ctx, value)?;
                stmt.push_sql(operator.as_sql()).push_sql(" ");
                stmt.push_value(value);
            }
        }
        Ok(stmt)
    }
}

/// Ordered group of conditions
#[derive(Debug, Default)]
pub struct LogicalCondition {
    pub join: JoinType,
    pub children: Vec<QueryCondition>,
}

impl LogicalCondition {
    pub fn new(join: JoinType) -> Self {
        Self {
            join,
            children: Vec::new(),
        }
    }

    pub fn push(&mut self, condition: QueryCondition) {
        self.children.push(condition);
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_compound(&self) -> bool {
        self.children.len() > 1
    }

    /// Render children joined by each child's own keyword
    pub fn finalize(&self, ctx: &QueryContext<'_>) -> Result<QueryStatement, QueryError> {
        let mut stmt = QueryStatement::new();
        for child in &self.children {
            let mut rendered = child.finalize(ctx)?;
            if rendered.is_empty() {
                continue;
            }
            if child.is_compound() {
                rendered = rendered.wrapped();
            }
            stmt.join(&format!(" {} ", child.join().keyword()), rendered);
        }
        Ok(stmt)
    }
}

/// `NOT (...)` around a condition
#[derive(Debug)]
pub struct NegatedCondition {
    pub join: JoinType,
    pub inner: Box<QueryCondition>,
}

impl NegatedCondition {
    pub fn finalize(&self, ctx: &QueryContext<'_>) -> Result<QueryStatement, QueryError> {
        let inner = self.inner.finalize(ctx)?;
        if inner.is_empty() {
            return Ok(inner);
        }
        let mut stmt = QueryStatement::from_sql("NOT ");
        stmt.append(inner.wrapped());
        Ok(stmt)
    }
}

/// Node of a condition tree
#[derive(Debug)]
pub enum QueryCondition {
    Specific(SpecificCondition),
    Logical(LogicalCondition),
    Negated(NegatedCondition),
}

impl QueryCondition {
    pub fn join(&self) -> JoinType {
        match self {
            QueryCondition::Specific(c) => c.join,
            QueryCondition::Logical(c) => c.join,
            QueryCondition::Negated(c) => c.join,
        }
    }

    /// Whether the node needs parentheses when embedded in a parent
    pub fn is_compound(&self) -> bool {
        match self {
            QueryCondition::Logical(c) => c.is_compound(),
            _ => false,
        }
    }

    pub fn finalize(&self, ctx: &QueryContext<'_>) -> Result<QueryStatement, QueryError> {
        match self {
            QueryCondition::Specific(c) => c.finalize(ctx),
            QueryCondition::Logical(c) => c.finalize(ctx),
            QueryCondition::Negated(c) => c.finalize(ctx),
        }
    }
}

/// How a negated condition is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negation {
    /// Replace the comparison's operator with its complement
    FlipOperator,
    /// Wrap the condition in `NOT (...)`
    WrapNot,
}

impl Negation {
    /// Negate `condition` using this strategy
    ///
    /// `FlipOperator` only applies to leaf comparisons; anything else is
    /// wrapped.
    pub fn apply(self, condition: QueryCondition) -> QueryCondition {
        match (self, condition) {
            (Negation::FlipOperator, QueryCondition::Specific(mut specific)) => {
                specific.operator = specific.operator.negate();
                QueryCondition::Specific(specific)
            }
            (_, condition) => QueryCondition::Negated(NegatedCondition {
                join: condition.join(),
                inner: Box::new(condition),
            }),
        }
    }
}
