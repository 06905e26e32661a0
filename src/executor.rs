//! Driver boundary.
//!
//! Provides the `Connection` and `Statement` traits that abstract the wire-level
//! database driver. The query builders, the transaction stack and the model
//! persistence helpers only ever talk to a database through these traits, so any
//! driver (or the in-memory [`MockConnection`](crate::mock::MockConnection)) can
//! be plugged in.

use crate::connection::ConnectionId;
use crate::query::Grammar;
use crate::value::Row;
use sea_query::Value;
use std::fmt;

/// Driver error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Reading from the database failed
    Read(String),
    /// Writing to the database failed
    Write(String),
    /// Other driver errors (syntax, constraint violations, ...)
    Other(String),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Read(s) => write!(f, "Read error: {s}"),
            DriverError::Write(s) => write!(f, "Write error: {s}"),
            DriverError::Other(s) => write!(f, "Driver error: {s}"),
        }
    }
}

impl std::error::Error for DriverError {}

/// Lazy, single-pass sequence of result rows
pub type RowIter<'c> = Box<dyn Iterator<Item = Result<Row, DriverError>> + 'c>;

/// A prepared statement
///
/// Statements are created by [`Connection::prepare`], bound once, and then
/// either executed or queried.
pub trait Statement<'c> {
    /// Bind positional values, in placeholder order
    fn bind(&mut self, values: &[Value]) -> Result<(), DriverError>;

    /// Execute the statement and return the number of rows affected
    fn execute(&mut self) -> Result<u64, DriverError>;

    /// Run the statement and return its rows
    ///
    /// The returned sequence is consumed once; running the query again needs a
    /// freshly prepared statement.
    fn query(self: Box<Self>) -> Result<RowIter<'c>, DriverError>;
}

/// Trait for a database connection
///
/// # Examples
///
/// ```
/// use lifeguard_query::{Connection, MockConnection, Value};
///
/// # fn main() -> Result<(), lifeguard_query::DriverError> {
/// let conn = MockConnection::new();
/// let mut stmt = conn.prepare("DELETE FROM `users` WHERE `id` = ?")?;
/// stmt.bind(&[Value::from(42i64)])?;
/// stmt.execute()?;
/// # Ok(())
/// # }
/// ```
pub trait Connection {
    /// Process-local identity of this connection
    fn id(&self) -> ConnectionId;

    /// Identifier quoting rules for this connection
    fn grammar(&self) -> &dyn Grammar;

    /// Prepare SQL text into an executable statement
    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn Statement<'c> + 'c>, DriverError>;

    /// Identifier generated by the last INSERT on this connection
    fn last_insert_id(&self) -> Result<Value, DriverError>;

    /// Issue a physical BEGIN
    fn begin_transaction(&self) -> Result<(), DriverError>;

    /// Issue a physical COMMIT
    fn commit(&self) -> Result<(), DriverError>;

    /// Issue a physical ROLLBACK
    fn rollback(&self) -> Result<(), DriverError>;
}
