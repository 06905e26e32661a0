//! Column, raw, and function expressions.
//!
//! Expressions appear in selections, in `ORDER BY`, as the left side of a
//! comparison, and as a right-hand operand (join conditions compare two
//! columns this way). Scalar function arguments are bound, never inlined.

use crate::error::QueryError;
use crate::query::context::QueryContext;
use crate::query::statement::QueryStatement;
use crate::value::CastType;
use sea_query::Value;

/// A renderable SQL expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Column reference, optionally qualified as `table.column`
    Column(String),
    /// Raw SQL, rendered as written
    Raw(String),
    /// Function call such as `COUNT(*)` or `COALESCE(col, ?)`
    Function { name: String, args: Vec<Argument> },
    /// Selected expression with an optional alias and cast
    Select {
        expression: Box<Expression>,
        alias: Option<String>,
        cast: Option<CastType>,
    },
}

/// Function argument
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Expression(Expression),
    /// Scalar, bound as a placeholder
    Value(Value),
}

/// Column reference
pub fn col(name: impl Into<String>) -> Expression {
    Expression::Column(name.into())
}

/// Raw SQL fragment
pub fn raw(sql: impl Into<String>) -> Expression {
    Expression::Raw(sql.into())
}

/// Function call
pub fn func<I, A>(name: impl Into<String>, args: I) -> Expression
where
    I: IntoIterator<Item = A>,
    A: Into<Argument>,
{
    Expression::Function {
        name: name.into(),
        args: args.into_iter().map(Into::into).collect(),
    }
}

impl Expression {
    /// `COUNT(expr)`
    pub fn count(expression: impl Into<Expression>) -> Self {
        func("COUNT", [expression.into()])
    }

    /// `SUM(expr)`
    pub fn sum(expression: impl Into<Expression>) -> Self {
        func("SUM", [expression.into()])
    }

    /// `AVG(expr)`
    pub fn avg(expression: impl Into<Expression>) -> Self {
        func("AVG", [expression.into()])
    }

    /// `MIN(expr)`
    pub fn min(expression: impl Into<Expression>) -> Self {
        func("MIN", [expression.into()])
    }

    /// `MAX(expr)`
    pub fn max(expression: impl Into<Expression>) -> Self {
        func("MAX", [expression.into()])
    }

    /// Wrap as a selected expression with an optional alias and cast
    ///
    /// ```rust
    /// use lifeguard_query::{col, CastType};
    ///
    /// let total = col("price").select(Some("total"), Some(CastType::Float));
    /// assert_eq!(total.output_name(), Some("total"));
    /// ```
    #[must_use]
    pub fn select(self, alias: Option<&str>, cast: Option<CastType>) -> Self {
        let expression = match self {
            Expression::Select { expression, .. } => expression,
            other => Box::new(other),
        };
        Expression::Select {
            expression,
            alias: alias.map(str::to_string),
            cast,
        }
    }

    /// Shorthand for `select(Some(alias), None)`
    #[must_use]
    pub fn alias(self, alias: &str) -> Self {
        self.select(Some(alias), None)
    }

    /// Column this expression refers to, looking through selections
    pub fn column_name(&self) -> Option<&str> {
        match self {
            Expression::Column(name) => Some(name),
            Expression::Select { expression, .. } => expression.column_name(),
            _ => None,
        }
    }

    /// Key the value of this expression comes back under in a result row
    pub fn output_name(&self) -> Option<&str> {
        match self {
            Expression::Select {
                alias: Some(alias), ..
            } => Some(alias),
            _ => self
                .column_name()
                .map(|name| name.rsplit('.').next().unwrap_or(name)),
        }
    }

    /// Render without touching the finalizer
    pub fn finalize(&self, ctx: &QueryContext<'_>) -> Result<QueryStatement, QueryError> {
        let grammar = ctx.grammar();
        match self {
            Expression::Column(name) => Ok(QueryStatement::from_sql(grammar.quote_column(name))),
            Expression::Raw(sql) => Ok(QueryStatement::from_sql(sql.as_str())),
            Expression::Function { name, args } => {
                let mut args_sql = QueryStatement::new();
                for arg in args {
                    let rendered = match arg {
                        Argument::Expression(expression) => expression.finalize(ctx)?,
                        Argument::Value(value) => {
                            let mut bound = QueryStatement::new();
                            bound.push_value(value.clone());
                            bound
                        }
                    };
                    args_sql.join(", ", rendered);
                }
                let mut stmt = QueryStatement::from_sql(format!("{name}("));
                stmt.append(args_sql).push_sql(")");
                Ok(stmt)
            }
            Expression::Select {
                expression, alias, ..
            } => {
                let mut stmt = expression.finalize(ctx)?;
                if let Some(alias) = alias {
                    stmt.push_sql(" AS ")
                        .push_sql(&grammar.quote_identifier(alias));
                }
                Ok(stmt)
            }
        }
    }

    /// Render as a selection item, registering its cast with the finalizer
    ///
    /// The cast is the explicit one if given, otherwise the schema cast of the
    /// underlying column. It is registered under the key the value comes back
    /// as, so the alias when there is one.
    pub fn finalize_selected(
        &self,
        ctx: &mut QueryContext<'_>,
    ) -> Result<QueryStatement, QueryError> {
        let explicit = match self {
            Expression::Select { cast, .. } => *cast,
            _ => None,
        };
        let cast = explicit.or_else(|| self.column_name().and_then(|name| ctx.cast_for(name)));
        if let (Some(cast), Some(key)) = (cast, self.output_name()) {
            if let Some(finalizer) = ctx.finalizer() {
                finalizer.add_cast(key, cast);
            }
        }
        self.finalize(ctx)
    }
}

impl From<&str> for Expression {
    fn from(name: &str) -> Self {
        col(name)
    }
}

impl From<String> for Expression {
    fn from(name: String) -> Self {
        col(name)
    }
}

impl From<&String> for Expression {
    fn from(name: &String) -> Self {
        col(name.as_str())
    }
}

impl From<Expression> for Argument {
    fn from(expression: Expression) -> Self {
        Argument::Expression(expression)
    }
}

macro_rules! scalar_argument {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Argument {
                fn from(value: $ty) -> Self {
                    Argument::Value(Value::from(value))
                }
            }
        )*
    };
}

scalar_argument!(i32, i64, u32, f64, bool, String, &str);

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Argument::Value(value)
    }
}
