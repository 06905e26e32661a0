//! A connection paired with its transaction registry.

use crate::connection::ConnectionRegistry;
use crate::error::QueryError;
use crate::executor::Connection;
use crate::transaction::Transaction;

/// Connection plus the registry arbitrating its transaction scopes
///
/// Writes made through a session can be wrapped in logical scopes with
/// [`transaction`](Self::transaction); scopes opened by nested calls share the
/// connection's single physical transaction.
#[derive(Clone, Copy)]
pub struct Session<'c> {
    connection: &'c dyn Connection,
    registry: &'c ConnectionRegistry,
}

impl<'c> Session<'c> {
    pub fn new(connection: &'c dyn Connection, registry: &'c ConnectionRegistry) -> Self {
        Self {
            connection,
            registry,
        }
    }

    pub fn connection(&self) -> &'c dyn Connection {
        self.connection
    }

    pub fn registry(&self) -> &'c ConnectionRegistry {
        self.registry
    }

    /// Open a logical scope by hand
    pub fn begin(&self) -> Result<Transaction<'c>, QueryError> {
        Transaction::begin(self.registry, self.connection)
    }

    /// Run `f` inside a logical scope
    ///
    /// The scope is accepted when `f` returns `Ok` and released either way.
    /// The closure's error wins over a failure to release.
    ///
    /// # Example
    ///
    /// ```
    /// use lifeguard_query::{raw_sql, ConnectionRegistry, MockConnection, QueryError, Session};
    ///
    /// let conn = MockConnection::new();
    /// let registry = ConnectionRegistry::new();
    /// let session = Session::new(&conn, &registry);
    ///
    /// let result: Result<(), QueryError> = session.transaction(|s| {
    ///     raw_sql::execute_unprepared(s.connection(), "DELETE FROM `carts`")?;
    ///     Err(QueryError::Hydration("abort".into()))
    /// });
    /// assert!(result.is_err());
    /// assert_eq!(conn.transaction_log(), vec!["BEGIN", "ROLLBACK"]);
    /// ```
    pub fn transaction<T, F>(&self, f: F) -> Result<T, QueryError>
    where
        F: FnOnce(&Session<'c>) -> Result<T, QueryError>,
    {
        let transaction = self.begin()?;
        let out = f(self);
        if out.is_ok() {
            transaction.accept();
        }
        let released = transaction.release();
        match (out, released) {
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
            (Ok(value), Ok(outcome)) => {
                if outcome == Some(false) {
                    log::warn!(
                        "Transaction on connection {} rolled back after its outermost scope succeeded",
                        self.connection.id()
                    );
                }
                Ok(value)
            }
        }
    }
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("connection", &self.connection.id())
            .field("registry", self.registry)
            .finish()
    }
}
