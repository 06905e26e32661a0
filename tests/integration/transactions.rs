//! Nested logical scopes sharing one physical transaction

use lifeguard_query::{
    lifeguard_txn, raw_sql, Connection, ConnectionRegistry, DriverError, MockConnection,
    QueryError, Session, Transaction,
};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_unaccepted_inner_scope_rolls_back_everything() {
    let conn = MockConnection::new();
    let registry = ConnectionRegistry::new();

    let outer = Transaction::begin(&registry, &conn).expect("begin outer");
    let inner = Transaction::begin(&registry, &conn).expect("begin inner");
    assert_eq!(inner.depth(), 2);

    // inner released without accept
    assert_eq!(inner.release(), Ok(None));
    outer.accept();
    assert_eq!(outer.release(), Ok(Some(false)));

    assert_eq!(conn.transaction_log(), vec!["BEGIN", "ROLLBACK"]);
}

#[test]
fn test_commit_notifies_listener_once() {
    let conn = MockConnection::new();
    let registry = ConnectionRegistry::new();
    let calls = Rc::new(RefCell::new(Vec::new()));

    let outer = Transaction::begin(&registry, &conn).expect("begin outer");
    let inner = Transaction::begin(&registry, &conn).expect("begin inner");
    let seen = Rc::clone(&calls);
    inner.on_complete(move |committed| seen.borrow_mut().push(committed));
    inner.accept();
    assert_eq!(inner.release(), Ok(None));
    assert!(calls.borrow().is_empty());

    outer.accept();
    assert_eq!(outer.release(), Ok(Some(true)));
    assert_eq!(*calls.borrow(), vec![true]);
    assert_eq!(conn.transaction_log(), vec!["BEGIN", "COMMIT"]);
}

#[test]
fn test_connections_have_independent_stacks() {
    let first = MockConnection::new();
    let second = MockConnection::new();
    let registry = ConnectionRegistry::new();

    let a = Transaction::begin(&registry, &first).expect("begin a");
    let b = Transaction::begin(&registry, &second).expect("begin b");
    assert_eq!(a.depth(), 1);
    assert_eq!(b.depth(), 1);
    assert_eq!(registry.len(), 2);

    b.accept();
    assert_eq!(b.release(), Ok(Some(true)));
    assert_eq!(a.release(), Ok(Some(false)));

    assert_eq!(first.transaction_log(), vec!["BEGIN", "ROLLBACK"]);
    assert_eq!(second.transaction_log(), vec!["BEGIN", "COMMIT"]);
    assert!(registry.contains(first.id()));
}

#[test]
fn test_session_scopes_wrap_writes() {
    let conn = MockConnection::new();
    let registry = ConnectionRegistry::new();
    let session = Session::new(&conn, &registry);

    let affected = session
        .transaction(|outer| {
            raw_sql::execute_unprepared(outer.connection(), "DELETE FROM `carts`")?;
            outer.transaction(|inner| {
                raw_sql::execute_unprepared(inner.connection(), "DELETE FROM `cart_items`")
            })
        })
        .expect("transaction");
    assert_eq!(affected, 0);

    let statements: Vec<String> = conn.statements().into_iter().map(|s| s.sql).collect();
    assert_eq!(statements, vec!["DELETE FROM `carts`", "DELETE FROM `cart_items`"]);
    assert_eq!(conn.transaction_log(), vec!["BEGIN", "COMMIT"]);
}

#[test]
fn test_failed_begin_propagates() {
    let conn = MockConnection::new();
    let registry = ConnectionRegistry::new();
    let session = Session::new(&conn, &registry);

    conn.fail_next_transaction_call(DriverError::Write("read-only replica".into()));
    let result: Result<(), QueryError> = session.transaction(|_| Ok(()));
    assert!(matches!(result, Err(QueryError::Driver(DriverError::Write(_)))));
    assert!(conn.transaction_log().is_empty());

    // the stack is still usable
    session.transaction(|_| Ok(())).expect("second transaction");
    assert_eq!(conn.transaction_log(), vec!["BEGIN", "COMMIT"]);
}

#[test]
fn test_macro_runs_block_in_scope() {
    let conn = MockConnection::new();
    let registry = ConnectionRegistry::new();
    let session = Session::new(&conn, &registry);

    let result: Result<u64, QueryError> = lifeguard_txn!(session, |s| {
        raw_sql::execute_unprepared(s.connection(), "UPDATE `counters` SET `n` = `n` + 1")
    });
    assert_eq!(result, Ok(0));

    let failed: Result<(), QueryError> =
        lifeguard_txn!(session, { Err(QueryError::Hydration("abort".into())) });
    assert!(failed.is_err());

    assert_eq!(
        conn.transaction_log(),
        vec!["BEGIN", "COMMIT", "BEGIN", "ROLLBACK"]
    );
}
