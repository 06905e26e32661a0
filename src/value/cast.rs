//! Column casts.
//!
//! A cast converts a raw driver value into its application form when a row is
//! hydrated (`from_db`) and an application value into its storage form when it
//! is bound to a statement (`to_db`). NULL of any variant always casts to the
//! NULL of the target variant.

use chrono::{NaiveDate, NaiveDateTime};
use sea_query::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Cast contract between storage and application values
pub trait Cast {
    /// Convert a raw value read from `column` into its application form
    fn from_db(&self, column: &str, raw: Value) -> Result<Value, CastError>;

    /// Convert an application value into its storage form
    fn to_db(&self, value: Value) -> Result<Value, CastError>;
}

/// Built-in cast types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastType {
    Integer,
    BigInteger,
    Float,
    Boolean,
    String,
    /// JSON document, stored as text
    Json,
    /// `YYYY-MM-DD HH:MM:SS`, stored as text
    DateTime,
    /// `YYYY-MM-DD`, stored as text
    Date,
}

/// Error raised when a value cannot be cast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastError {
    pub cast: CastType,
    pub column: Option<String>,
    pub message: String,
}

impl CastError {
    fn new(cast: CastType, message: impl Into<String>) -> Self {
        Self {
            cast,
            column: None,
            message: message.into(),
        }
    }

    fn incompatible(cast: CastType, value: &Value) -> Self {
        Self::new(cast, format!("incompatible value {:?}", value))
    }

    fn on_column(mut self, column: &str) -> Self {
        self.column = Some(column.to_string());
        self
    }
}

impl fmt::Display for CastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => write!(f, "{:?} cast of column {}: {}", self.cast, column, self.message),
            None => write!(f, "{:?} cast: {}", self.cast, self.message),
        }
    }
}

impl std::error::Error for CastError {}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::TinyInt(Some(v)) => Some(i64::from(*v)),
        Value::SmallInt(Some(v)) => Some(i64::from(*v)),
        Value::Int(Some(v)) => Some(i64::from(*v)),
        Value::BigInt(Some(v)) => Some(*v),
        Value::TinyUnsigned(Some(v)) => Some(i64::from(*v)),
        Value::SmallUnsigned(Some(v)) => Some(i64::from(*v)),
        Value::Unsigned(Some(v)) => Some(i64::from(*v)),
        Value::BigUnsigned(Some(v)) => i64::try_from(*v).ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Float(Some(v)) => Some(f64::from(*v)),
        Value::Double(Some(v)) => Some(*v),
        _ => as_i64(value).map(|v| v as f64),
    }
}

fn as_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(Some(s)) => Some(s.as_str()),
        _ => None,
    }
}

impl CastType {
    fn null(self) -> Value {
        match self {
            CastType::Integer => Value::Int(None),
            CastType::BigInteger => Value::BigInt(None),
            CastType::Float => Value::Double(None),
            CastType::Boolean => Value::Bool(None),
            CastType::String => Value::String(None),
            CastType::Json => Value::Json(None),
            CastType::DateTime => Value::ChronoDateTime(None),
            CastType::Date => Value::ChronoDate(None),
        }
    }

    /// Normalize any compatible value into this cast's application variant
    fn normalize(self, value: Value) -> Result<Value, CastError> {
        if super::is_null(&value) {
            return Ok(self.null());
        }
        match self {
            CastType::Integer => {
                let v = match as_str(&value) {
                    Some(s) => s.trim().parse::<i64>().ok(),
                    None => as_i64(&value),
                }
                .ok_or_else(|| CastError::incompatible(self, &value))?;
                i32::try_from(v)
                    .map(Value::from)
                    .map_err(|_| CastError::new(self, format!("{v} is out of range")))
            }
            CastType::BigInteger => match as_str(&value) {
                Some(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|e| CastError::new(self, e.to_string())),
                None => as_i64(&value)
                    .map(Value::from)
                    .ok_or_else(|| CastError::incompatible(self, &value)),
            },
            CastType::Float => match as_str(&value) {
                Some(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::from)
                    .map_err(|e| CastError::new(self, e.to_string())),
                None => as_f64(&value)
                    .map(Value::from)
                    .ok_or_else(|| CastError::incompatible(self, &value)),
            },
            CastType::Boolean => match (&value, as_str(&value), as_i64(&value)) {
                (Value::Bool(Some(b)), _, _) => Ok(Value::from(*b)),
                (_, Some(s), _) => match s.trim().to_ascii_lowercase().as_str() {
                    "1" | "true" => Ok(Value::from(true)),
                    "0" | "false" | "" => Ok(Value::from(false)),
                    _ => Err(CastError::incompatible(self, &value)),
                },
                (_, _, Some(i)) => Ok(Value::from(i != 0)),
                _ => Err(CastError::incompatible(self, &value)),
            },
            CastType::String => match &value {
                Value::String(Some(_)) => Ok(value.clone()),
                Value::Bool(Some(b)) => Ok(Value::from(b.to_string())),
                Value::Char(Some(c)) => Ok(Value::from(c.to_string())),
                _ => as_i64(&value)
                    .map(|i| i.to_string())
                    .or_else(|| as_f64(&value).map(|f| f.to_string()))
                    .map(Value::from)
                    .ok_or_else(|| CastError::incompatible(self, &value)),
            },
            CastType::Json => match as_str(&value) {
                Some(s) => serde_json::from_str::<serde_json::Value>(s)
                    .map(Value::from)
                    .map_err(|e| CastError::new(self, e.to_string())),
                None => match &value {
                    Value::Json(Some(_)) => Ok(value.clone()),
                    _ => Err(CastError::incompatible(self, &value)),
                },
            },
            CastType::DateTime => match as_str(&value) {
                Some(s) => NaiveDateTime::parse_from_str(s.trim(), DATETIME_FORMAT)
                    .or_else(|_| {
                        chrono::DateTime::parse_from_rfc3339(s.trim()).map(|dt| dt.naive_utc())
                    })
                    .map(Value::from)
                    .map_err(|e| CastError::new(self, e.to_string())),
                None => match &value {
                    Value::ChronoDateTime(Some(_)) => Ok(value.clone()),
                    _ => Err(CastError::incompatible(self, &value)),
                },
            },
            CastType::Date => match as_str(&value) {
                Some(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                    .map(Value::from)
                    .map_err(|e| CastError::new(self, e.to_string())),
                None => match &value {
                    Value::ChronoDate(Some(_)) => Ok(value.clone()),
                    _ => Err(CastError::incompatible(self, &value)),
                },
            },
        }
    }
}

impl Cast for CastType {
    fn from_db(&self, column: &str, raw: Value) -> Result<Value, CastError> {
        self.normalize(raw).map_err(|e| e.on_column(column))
    }

    fn to_db(&self, value: Value) -> Result<Value, CastError> {
        let value = self.normalize(value)?;
        // text-backed casts are stored in their serialized form
        Ok(match (self, &value) {
            (CastType::Json, Value::Json(Some(json))) => Value::from(json.to_string()),
            (CastType::DateTime, Value::ChronoDateTime(Some(dt))) => {
                Value::from(dt.format(DATETIME_FORMAT).to_string())
            }
            (CastType::Date, Value::ChronoDate(Some(d))) => {
                Value::from(d.format(DATE_FORMAT).to_string())
            }
            (CastType::Json, _) | (CastType::DateTime, _) | (CastType::Date, _) => {
                Value::String(None)
            }
            _ => value,
        })
    }
}
