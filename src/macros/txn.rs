/// Run a block inside a transaction scope of a [`Session`](crate::Session).
///
/// The block evaluates to a `Result<_, QueryError>`; `Ok` accepts the scope
/// and the scope is released either way. Use the two-argument form to name
/// the session inside the block.
///
/// ```
/// use lifeguard_query::{lifeguard_txn, raw_sql, ConnectionRegistry, MockConnection, QueryError, Session};
///
/// let conn = MockConnection::new();
/// let registry = ConnectionRegistry::new();
/// let session = Session::new(&conn, &registry);
///
/// let affected: Result<u64, QueryError> = lifeguard_txn!(session, |s| {
///     raw_sql::execute_unprepared(s.connection(), "DELETE FROM `carts`")
/// });
/// assert!(affected.is_ok());
/// assert_eq!(conn.transaction_log(), vec!["BEGIN", "COMMIT"]);
/// ```
#[macro_export]
macro_rules! lifeguard_txn {
    ($session:expr, |$scope:ident| $block:block) => {{
        $session.transaction(|$scope| $block)
    }};
    ($session:expr, $block:block) => {{
        $session.transaction(|_| $block)
    }};
}
