//! SQL text plus positional bound values.

use sea_query::Value;

/// Mutable accumulator of SQL text and the values bound to its `?` placeholders
///
/// Every method that writes a `?` into the text pushes the matching value in
/// the same call, so placeholders and values can never drift apart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryStatement {
    sql: String,
    values: Vec<Value>,
}

impl QueryStatement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statement holding literal SQL and no values
    pub fn from_sql(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            values: Vec::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.values)
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Append literal SQL; it must not contain placeholders
    pub fn push_sql(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Append one `?` bound to `value`
    pub fn push_value(&mut self, value: Value) -> &mut Self {
        self.sql.push('?');
        self.values.push(value);
        self
    }

    /// Append `?, ?, ...`, one placeholder per value
    pub fn push_values<I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = Value>,
    {
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_value(value);
        }
        self
    }

    /// Append another statement's text and values
    pub fn append(&mut self, other: QueryStatement) -> &mut Self {
        self.sql.push_str(&other.sql);
        self.values.extend(other.values);
        self
    }

    /// Append `other` after `separator`, skipping empty parts
    ///
    /// Nothing happens when `other` is empty; the separator is only written
    /// when this statement already has text.
    pub fn join(&mut self, separator: &str, other: QueryStatement) -> &mut Self {
        if other.is_empty() {
            return self;
        }
        if !self.is_empty() {
            self.sql.push_str(separator);
        }
        self.append(other)
    }

    /// This statement wrapped in parentheses
    #[must_use]
    pub fn wrapped(self) -> Self {
        Self {
            sql: format!("({})", self.sql),
            values: self.values,
        }
    }

    /// Number of `?` placeholders in the text
    ///
    /// Question marks inside quoted literals or quoted identifiers are not
    /// placeholders and are skipped.
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        let mut quote: Option<char> = None;
        for c in self.sql.chars() {
            match (quote, c) {
                // a doubled quote closes and reopens, which nets out
                (Some(open), c) if c == open => quote = None,
                (Some(_), _) => {}
                (None, '\'' | '"' | '`') => quote = Some(c),
                (None, '?') => count += 1,
                (None, _) => {}
            }
        }
        count
    }

    /// Whether placeholders and bound values line up one to one
    pub fn is_balanced(&self) -> bool {
        self.placeholder_count() == self.values.len()
    }
}
