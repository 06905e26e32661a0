//! Value handling for Lifeguard Query
//!
//! Bound parameters and raw driver values are both `sea_query::Value`. This
//! module provides the containers rows and models travel in, plus the cast
//! contract used to move values between their storage and application forms.
//!
//! - **`Row`** - ordered column/value pairs as returned by the driver
//! - **`Attributes`** - typed key-value container backing hydrated records
//! - **`DynamicRecord`** - schema-less record for partially selected rows
//! - **`TryGetable`** - safe extraction of Rust values from `Value`
//! - **`Cast` / `CastType`** - storage <-> application conversions

pub mod attributes;
pub mod cast;
pub mod row;
pub mod try_getable;

pub use attributes::{Attributes, DynamicRecord};
pub use cast::{Cast, CastError, CastType};
pub use row::Row;
pub use try_getable::{TryGetable, ValueExtractionError};

use sea_query::Value;

/// Whether a value is SQL NULL, whatever its variant
pub fn is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::Json(None)
            | Value::ChronoDate(None)
            | Value::ChronoTime(None)
            | Value::ChronoDateTime(None)
    )
}
