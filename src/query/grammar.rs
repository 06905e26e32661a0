//! Identifier quoting rules.
//!
//! Dialect differences beyond identifier quoting are left to the driver; the
//! builders only ever ask a `Grammar` how to quote a table or column name.

use crate::config::QuoteStyle;

/// Identifier quoting rules of a connection
pub trait Grammar {
    /// Quote a single identifier segment
    fn quote_identifier(&self, identifier: &str) -> String;

    /// Quote a possibly qualified column (`table.column`), leaving `*` bare
    fn quote_column(&self, column: &str) -> String {
        column
            .split('.')
            .map(|segment| {
                if segment == "*" {
                    segment.to_string()
                } else {
                    self.quote_identifier(segment)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quote a table name
    fn quote_table(&self, table: &str) -> String {
        self.quote_column(table)
    }
}

/// Standard grammar quoting identifiers with backticks or double quotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SqlGrammar {
    quote_style: QuoteStyle,
}

impl SqlGrammar {
    /// Backtick quoting, the default
    pub const BACKTICK: SqlGrammar = SqlGrammar {
        quote_style: QuoteStyle::Backtick,
    };

    /// ANSI double-quote quoting
    pub const ANSI: SqlGrammar = SqlGrammar {
        quote_style: QuoteStyle::DoubleQuote,
    };

    pub const fn new(quote_style: QuoteStyle) -> Self {
        Self { quote_style }
    }

    pub fn quote_style(&self) -> QuoteStyle {
        self.quote_style
    }
}

impl Grammar for SqlGrammar {
    fn quote_identifier(&self, identifier: &str) -> String {
        let quote = match self.quote_style {
            QuoteStyle::Backtick => '`',
            QuoteStyle::DoubleQuote => '"',
        };
        let escaped = identifier.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }
}

/// Grammar used when a context has no connection to ask
pub static DEFAULT_GRAMMAR: SqlGrammar = SqlGrammar::BACKTICK;
