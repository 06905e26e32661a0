//! TryGetable trait for safe value extraction
//!
//! Hydration functions pull typed fields out of [`Attributes`](super::Attributes)
//! through this trait. Extraction distinguishes null values from type
//! mismatches so `Option<T>` fields can accept NULL while required fields
//! reject it.

use chrono::{NaiveDate, NaiveDateTime};
use sea_query::Value;

/// Error type for value extraction failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExtractionError {
    /// The value is null (None variant)
    NullValue,
    /// The value type doesn't match the expected type
    TypeMismatch {
        expected: String,
        actual: String,
    },
}

impl std::fmt::Display for ValueExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueExtractionError::NullValue => write!(f, "Value is null"),
            ValueExtractionError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for ValueExtractionError {}

/// Trait for safe value extraction with error handling
///
/// ## Usage
///
/// ```rust
/// use lifeguard_query::value::{TryGetable, ValueExtractionError};
/// use sea_query::Value;
///
/// let value = Value::Int(Some(42));
/// let result: Result<i32, ValueExtractionError> = TryGetable::try_get(value);
/// assert_eq!(result, Ok(42));
///
/// let null_value = Value::Int(None);
/// let result: Result<i32, ValueExtractionError> = TryGetable::try_get(null_value);
/// assert!(matches!(result, Err(ValueExtractionError::NullValue)));
/// ```
pub trait TryGetable: Sized {
    /// Try to extract a value from `sea_query::Value`
    fn try_get(value: Value) -> Result<Self, ValueExtractionError>;
}

fn mismatch(expected: &str, value: &Value) -> ValueExtractionError {
    ValueExtractionError::TypeMismatch {
        expected: expected.to_string(),
        actual: format!("{:?}", value),
    }
}

macro_rules! impl_try_getable {
    ($type:ty, $variant:ident, $expected:expr) => {
        impl TryGetable for $type {
            fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
                match value {
                    Value::$variant(Some(v)) => Ok(v),
                    Value::$variant(None) => Err(ValueExtractionError::NullValue),
                    _ => Err(mismatch($expected, &value)),
                }
            }
        }
    };
}

impl_try_getable!(i8, TinyInt, "TinyInt");
impl_try_getable!(i16, SmallInt, "SmallInt");
impl_try_getable!(i32, Int, "Int");
impl_try_getable!(i64, BigInt, "BigInt");
impl_try_getable!(u32, Unsigned, "Unsigned");
impl_try_getable!(u64, BigUnsigned, "BigUnsigned");
impl_try_getable!(f32, Float, "Float");
impl_try_getable!(f64, Double, "Double");
impl_try_getable!(bool, Bool, "Bool");

impl TryGetable for String {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::String(Some(v)) => Ok(v.to_string()),
            Value::String(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("String", &value)),
        }
    }
}

impl TryGetable for serde_json::Value {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match &value {
            Value::Json(Some(v)) => Ok(serde_json::Value::clone(v)),
            Value::Json(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("Json", &value)),
        }
    }
}

impl TryGetable for NaiveDateTime {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match &value {
            Value::ChronoDateTime(Some(v)) => Ok(NaiveDateTime::clone(v)),
            Value::ChronoDateTime(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("ChronoDateTime", &value)),
        }
    }
}

impl TryGetable for NaiveDate {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match &value {
            Value::ChronoDate(Some(v)) => Ok(NaiveDate::clone(v)),
            Value::ChronoDate(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("ChronoDate", &value)),
        }
    }
}

// Null of any variant maps to None
impl<T: TryGetable> TryGetable for Option<T> {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        if super::is_null(&value) {
            return Ok(None);
        }
        T::try_get(value).map(Some)
    }
}
