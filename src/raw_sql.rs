//! Raw SQL Helpers
//!
//! Every statement the builders produce goes through [`prepare`], which logs
//! it, instruments it, prepares it on the connection and binds its values.
//! The other helpers run a prepared statement and return affected rows or the
//! lazy row sequence.

use crate::error::QueryError;
use crate::executor::{Connection, RowIter, Statement};
use crate::query::QueryStatement;
use crate::value::Row;
use std::time::Instant;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Prepare `statement` on `connection` and bind its values
///
/// # Errors
///
/// Read/write failures of the driver are wrapped into
/// `QueryError::OperationFailed`; other driver errors pass through as
/// `QueryError::Driver`.
pub fn prepare<'c>(
    connection: &'c dyn Connection,
    statement: &QueryStatement,
) -> Result<Box<dyn Statement<'c> + 'c>, QueryError> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::prepare_statement_span(statement.sql()).entered();

    log::debug!(
        "Preparing on connection {}: {} {:?}",
        connection.id(),
        statement.sql(),
        statement.values()
    );

    let prepared = connection
        .prepare(statement.sql())
        .and_then(|mut prepared| {
            prepared.bind(statement.values())?;
            Ok(prepared)
        })
        .map_err(|e| {
            #[cfg(feature = "metrics")]
            METRICS.record_statement_error();
            log::debug!("Failed to prepare '{}': {e}", statement.sql());
            QueryError::from_prepare(e)
        })?;
    Ok(prepared)
}

/// Execute a statement and return the number of affected rows
///
/// # Examples
///
/// ```
/// use lifeguard_query::{raw_sql, MockConnection, QueryStatement, Value};
///
/// let conn = MockConnection::new();
/// conn.set_affected_rows(2);
/// let mut stmt = QueryStatement::from_sql("DELETE FROM `sessions` WHERE `user_id` = ");
/// stmt.push_value(Value::from(42));
/// assert_eq!(raw_sql::execute(&conn, &stmt).unwrap(), 2);
/// ```
pub fn execute(connection: &dyn Connection, statement: &QueryStatement) -> Result<u64, QueryError> {
    let start = Instant::now();
    let mut prepared = prepare(connection, statement)?;
    let result = prepared.execute().map_err(QueryError::Driver);
    record(start, result.is_ok());
    result
}

/// Execute SQL text with no bound values
pub fn execute_unprepared(connection: &dyn Connection, sql: &str) -> Result<u64, QueryError> {
    execute(connection, &QueryStatement::from_sql(sql))
}

/// Run a query and return its rows as a lazy single-pass sequence
pub fn query<'c>(
    connection: &'c dyn Connection,
    statement: &QueryStatement,
) -> Result<RowIter<'c>, QueryError> {
    let start = Instant::now();
    let prepared = prepare(connection, statement)?;
    let result = prepared.query().map_err(QueryError::Driver);
    record(start, result.is_ok());
    result
}

/// Run a query and return its first row, if any
pub fn query_one(
    connection: &dyn Connection,
    statement: &QueryStatement,
) -> Result<Option<Row>, QueryError> {
    let mut rows = query(connection, statement)?;
    rows.next().transpose().map_err(QueryError::Driver)
}

#[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
fn record(start: Instant, succeeded: bool) {
    #[cfg(feature = "metrics")]
    {
        METRICS.record_statement(start.elapsed());
        if !succeeded {
            METRICS.record_statement_error();
        }
    }
}
