//! Model contract.
//!
//! A model is a Rust type bound to one table. It exposes its table's schema,
//! rebuilds itself from hydrated [`Attributes`], and flattens itself back into
//! attributes for writes. Schemas are usually `once_cell` statics:
//!
//! ```rust
//! use lifeguard_query::{Attributes, CastType, ColumnSchema, Model, QueryError, TableSchema};
//! use once_cell::sync::Lazy;
//!
//! static USERS: Lazy<TableSchema> = Lazy::new(|| {
//!     TableSchema::new("users")
//!         .with_column(ColumnSchema::new("id").cast(CastType::BigInteger).primary_key())
//!         .with_column(ColumnSchema::new("email").cast(CastType::String))
//! });
//!
//! struct User {
//!     id: Option<i64>,
//!     email: String,
//! }
//!
//! impl Model for User {
//!     fn schema() -> &'static TableSchema {
//!         &USERS
//!     }
//!
//!     fn hydrate(mut attributes: Attributes) -> Result<Self, QueryError> {
//!         Ok(Self {
//!             id: attributes.take("id")?,
//!             email: attributes.take("email")?,
//!         })
//!     }
//!
//!     fn attributes(&self) -> Attributes {
//!         Attributes::new()
//!             .with("id", self.id)
//!             .with("email", self.email.clone())
//!     }
//! }
//! ```

use crate::error::QueryError;
use crate::query::{Query, TableSchema};
use crate::value::{is_null, Attributes};
use sea_query::Value;

/// Rust type bound to one table
pub trait Model: Sized + 'static {
    fn schema() -> &'static TableSchema;

    /// Build an instance from a fully selected, cast row
    fn hydrate(attributes: Attributes) -> Result<Self, QueryError>;

    /// Current column values
    fn attributes(&self) -> Attributes;

    /// Start a query over this model's table
    fn query() -> Query<Self> {
        Query::new()
    }

    /// Primary key values, if every key column is set and not NULL
    fn identity(&self) -> Option<Vec<(String, Value)>> {
        let attributes = self.attributes();
        let keys: Vec<(String, Value)> = Self::schema()
            .primary_keys()
            .map(|column| {
                attributes
                    .get_attribute(&column.name)
                    .filter(|value| !is_null(value))
                    .map(|value| (column.name.clone(), value.clone()))
            })
            .collect::<Option<_>>()?;
        if keys.is_empty() {
            None
        } else {
            Some(keys)
        }
    }
}
