//! Table schema metadata.

mod definition;

pub use definition::{ColumnSchema, TableSchema};
