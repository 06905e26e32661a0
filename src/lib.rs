//! # Lifeguard Query
//!
//! Query construction and transaction coordination for Lifeguard.
//!
//! Fluent builder calls are turned into parameterized SQL text with positional
//! `?` placeholders, result rows are hydrated back into typed models (including
//! multi-table joint queries), and nested logical transaction scopes are
//! arbitrated onto one physical transaction per connection.
//!
//! See [README on GitHub](https://github.com/microscaler/lifeguard) for full architecture.

pub mod active_model;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
mod macros;
pub mod metrics;
pub mod mock;
pub mod model;
pub mod query;
pub mod raw_sql;
pub mod session;
pub mod transaction;
pub mod value;

pub use active_model::{ActiveModelTrait, SaveOutcome};
pub use config::{QueryConfig, QuoteStyle};
pub use connection::{ConnectionId, ConnectionRegistry};
pub use error::QueryError;
pub use executor::{Connection, DriverError, RowIter, Statement};
pub use mock::MockConnection;
pub use model::Model;
pub use query::{
    col, func, raw, ColumnSchema, ConditionScope, Expression, Filterable, JoinKind, JoinType,
    JointQuery, JointRecord, Operand, Operator, Order, Query, QueryStatement, TableSchema,
};
pub use session::Session;
pub use transaction::{Transaction, TransactionStack};
pub use value::{Attributes, Cast, CastType, DynamicRecord, Row};

pub use sea_query::Value;
