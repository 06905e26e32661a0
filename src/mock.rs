//! In-memory recording connection.
//!
//! [`MockConnection`] implements [`Connection`] without a database: it records
//! every statement that is executed or queried together with its bound values,
//! logs the transaction primitives it is asked for, and serves queued result
//! sets in order. Failures can be injected for the next prepare or the next
//! transaction primitive.

use crate::connection::ConnectionId;
use crate::executor::{Connection, DriverError, RowIter, Statement};
use crate::query::{Grammar, SqlGrammar};
use crate::value::Row;
use sea_query::Value;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// A statement as the mock saw it run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub values: Vec<Value>,
}

/// Recording [`Connection`] for tests
///
/// # Example
///
/// ```
/// use lifeguard_query::{raw_sql, MockConnection, QueryStatement, Row, Value};
///
/// let conn = MockConnection::new();
/// conn.push_result(vec![Row::new().with("id", 1)]);
///
/// let rows = raw_sql::query(&conn, &QueryStatement::from_sql("SELECT id FROM t")).unwrap();
/// assert_eq!(rows.count(), 1);
/// assert_eq!(conn.last_statement().unwrap().sql, "SELECT id FROM t");
/// ```
pub struct MockConnection {
    id: ConnectionId,
    grammar: SqlGrammar,
    statements: RefCell<Vec<ExecutedStatement>>,
    results: RefCell<VecDeque<Vec<Row>>>,
    transaction_log: RefCell<Vec<&'static str>>,
    prepare_failure: RefCell<Option<DriverError>>,
    transaction_failure: RefCell<Option<DriverError>>,
    affected_rows: Cell<u64>,
    last_insert_id: RefCell<Value>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::with_grammar(SqlGrammar::default())
    }

    pub fn with_grammar(grammar: SqlGrammar) -> Self {
        Self {
            id: ConnectionId::next(),
            grammar,
            statements: RefCell::new(Vec::new()),
            results: RefCell::new(VecDeque::new()),
            transaction_log: RefCell::new(Vec::new()),
            prepare_failure: RefCell::new(None),
            transaction_failure: RefCell::new(None),
            affected_rows: Cell::new(0),
            last_insert_id: RefCell::new(Value::BigInt(None)),
        }
    }

    /// Queue the rows the next query returns
    pub fn push_result(&self, rows: Vec<Row>) {
        self.results.borrow_mut().push_back(rows);
    }

    /// Statements run so far, oldest first
    pub fn statements(&self) -> Vec<ExecutedStatement> {
        self.statements.borrow().clone()
    }

    pub fn last_statement(&self) -> Option<ExecutedStatement> {
        self.statements.borrow().last().cloned()
    }

    /// `BEGIN`, `COMMIT` and `ROLLBACK` calls that succeeded, in order
    pub fn transaction_log(&self) -> Vec<&'static str> {
        self.transaction_log.borrow().clone()
    }

    pub fn fail_next_prepare(&self, error: DriverError) {
        *self.prepare_failure.borrow_mut() = Some(error);
    }

    /// Make the next BEGIN, COMMIT or ROLLBACK fail
    pub fn fail_next_transaction_call(&self, error: DriverError) {
        *self.transaction_failure.borrow_mut() = Some(error);
    }

    /// Row count every `execute()` reports
    pub fn set_affected_rows(&self, rows: u64) {
        self.affected_rows.set(rows);
    }

    pub fn set_last_insert_id(&self, id: impl Into<Value>) {
        *self.last_insert_id.borrow_mut() = id.into();
    }

    /// Forget recorded statements and transaction calls
    pub fn clear(&self) {
        self.statements.borrow_mut().clear();
        self.transaction_log.borrow_mut().clear();
    }

    fn record(&self, sql: &str, values: &[Value]) {
        self.statements.borrow_mut().push(ExecutedStatement {
            sql: sql.to_string(),
            values: values.to_vec(),
        });
    }

    fn transaction_call(&self, primitive: &'static str) -> Result<(), DriverError> {
        if let Some(error) = self.transaction_failure.borrow_mut().take() {
            return Err(error);
        }
        self.transaction_log.borrow_mut().push(primitive);
        Ok(())
    }
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockConnection")
            .field("id", &self.id)
            .field("statements", &self.statements.borrow().len())
            .field("queued_results", &self.results.borrow().len())
            .finish()
    }
}

struct MockStatement<'c> {
    connection: &'c MockConnection,
    sql: String,
    values: Vec<Value>,
}

impl<'c> Statement<'c> for MockStatement<'c> {
    fn bind(&mut self, values: &[Value]) -> Result<(), DriverError> {
        self.values = values.to_vec();
        Ok(())
    }

    fn execute(&mut self) -> Result<u64, DriverError> {
        self.connection.record(&self.sql, &self.values);
        Ok(self.connection.affected_rows.get())
    }

    fn query(self: Box<Self>) -> Result<RowIter<'c>, DriverError> {
        self.connection.record(&self.sql, &self.values);
        let rows = self
            .connection
            .results
            .borrow_mut()
            .pop_front()
            .unwrap_or_default();
        Ok(Box::new(rows.into_iter().map(Ok)))
    }
}

impl Connection for MockConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn grammar(&self) -> &dyn Grammar {
        &self.grammar
    }

    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn Statement<'c> + 'c>, DriverError> {
        if let Some(error) = self.prepare_failure.borrow_mut().take() {
            return Err(error);
        }
        Ok(Box::new(MockStatement {
            connection: self,
            sql: sql.to_string(),
            values: Vec::new(),
        }))
    }

    fn last_insert_id(&self) -> Result<Value, DriverError> {
        Ok(self.last_insert_id.borrow().clone())
    }

    fn begin_transaction(&self) -> Result<(), DriverError> {
        self.transaction_call("BEGIN")
    }

    fn commit(&self) -> Result<(), DriverError> {
        self.transaction_call("COMMIT")
    }

    fn rollback(&self) -> Result<(), DriverError> {
        self.transaction_call("ROLLBACK")
    }
}
