//! Error type for query building, execution and hydration.
//!
//! `QueryError` is the single error surfaced by the builder API. Argument and
//! shape errors are raised while a query is being built, state errors when a
//! read or write is attempted on an unusable builder or record, and driver
//! failures are either wrapped (`OperationFailed`) or passed through (`Driver`).

use crate::executor::DriverError;
use crate::value::CastError;
use std::fmt;

/// Error type for query operations
#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    /// A column specification the builder cannot render
    UnsupportedColumn(String),
    /// An operator token that does not name a known comparison
    UnsupportedOperator(String),
    /// A comparison value whose shape the operator cannot take
    UnsupportedValue {
        /// SQL text of the operator
        operator: String,
        /// What was wrong with the value
        reason: String,
    },
    /// `list()`/`first()` was called after `select()` reset the selection
    SelectionReset,
    /// A write needed primary key values the record does not carry
    MissingIdentity {
        /// Table the record belongs to
        table: String,
    },
    /// A partially selected row was asked to become a fully typed model
    PartialSelection,
    /// The model hydration function rejected a row
    Hydration(String),
    /// A value could not be converted by a column cast
    Cast(CastError),
    /// The driver failed to read or write while turning SQL into a statement
    OperationFailed(DriverError),
    /// Any other driver failure, unchanged
    Driver(DriverError),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::UnsupportedColumn(column) => {
                write!(f, "Unsupported column specification: {column}")
            }
            QueryError::UnsupportedOperator(token) => {
                write!(f, "Unsupported operator: '{token}'")
            }
            QueryError::UnsupportedValue { operator, reason } => {
                write!(f, "Unsupported value for operator {operator}: {reason}")
            }
            QueryError::SelectionReset => {
                write!(
                    f,
                    "Selection was reset by select(); rows cannot be hydrated into models"
                )
            }
            QueryError::MissingIdentity { table } => {
                write!(f, "Record of table '{table}' has no identifying attributes")
            }
            QueryError::PartialSelection => {
                write!(f, "Partially selected row cannot be hydrated into a model")
            }
            QueryError::Hydration(msg) => write!(f, "Hydration error: {msg}"),
            QueryError::Cast(e) => write!(f, "Cast error: {e}"),
            QueryError::OperationFailed(e) => write!(f, "Operation failed: {e}"),
            QueryError::Driver(e) => write!(f, "Driver error: {e}"),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Cast(e) => Some(e),
            QueryError::OperationFailed(e) | QueryError::Driver(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CastError> for QueryError {
    fn from(err: CastError) -> Self {
        QueryError::Cast(err)
    }
}

impl From<DriverError> for QueryError {
    fn from(err: DriverError) -> Self {
        QueryError::Driver(err)
    }
}

impl QueryError {
    /// Wrap a failure raised while preparing a built statement.
    ///
    /// Read and write failures collapse into `OperationFailed`; everything
    /// else is passed through unchanged.
    pub fn from_prepare(err: DriverError) -> Self {
        match err {
            DriverError::Read(_) | DriverError::Write(_) => QueryError::OperationFailed(err),
            DriverError::Other(_) => QueryError::Driver(err),
        }
    }

    /// Whether this error belongs to the programmer-error state class
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            QueryError::SelectionReset | QueryError::MissingIdentity { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_errors_are_wrapped_by_kind() {
        let read = QueryError::from_prepare(DriverError::Read("socket closed".into()));
        assert!(matches!(read, QueryError::OperationFailed(DriverError::Read(_))));

        let write = QueryError::from_prepare(DriverError::Write("broken pipe".into()));
        assert!(matches!(write, QueryError::OperationFailed(DriverError::Write(_))));

        let other = QueryError::from_prepare(DriverError::Other("syntax".into()));
        assert!(matches!(other, QueryError::Driver(DriverError::Other(_))));
    }

    #[test]
    fn test_state_errors() {
        assert!(QueryError::SelectionReset.is_state_error());
        assert!(QueryError::MissingIdentity {
            table: "users".into()
        }
        .is_state_error());
        assert!(!QueryError::UnsupportedOperator("~".into()).is_state_error());
    }

    #[test]
    fn test_display() {
        let err = QueryError::UnsupportedOperator("~~".into());
        assert!(err.to_string().contains("Unsupported operator"));
        let err = QueryError::MissingIdentity {
            table: "users".into(),
        };
        assert!(err.to_string().contains("users"));
    }
}
