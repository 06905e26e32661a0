//! Insert, update, save and delete through ActiveModelTrait

use crate::common::{AuditEntry, Purchase, User};
use lifeguard_query::{
    ActiveModelTrait, ConnectionRegistry, DriverError, MockConnection, QueryError, SaveOutcome,
    Session, Value,
};

fn alice(id: Option<i64>) -> User {
    User {
        id,
        name: "alice".to_string(),
    }
}

#[test]
fn test_insert_leaves_out_unset_primary_key() {
    let conn = MockConnection::new();
    let registry = ConnectionRegistry::new();
    let session = Session::new(&conn, &registry);
    conn.set_last_insert_id(5i64);

    let id = alice(None).insert(&session).expect("insert");
    assert_eq!(id, Value::from(5i64));

    let executed = conn.last_statement().expect("statement");
    assert_eq!(executed.sql, "INSERT INTO `users` (`name`) VALUES (?)");
    assert_eq!(executed.values, vec![Value::from("alice")]);
    assert_eq!(conn.transaction_log(), vec!["BEGIN", "COMMIT"]);
}

#[test]
fn test_insert_stores_casts_in_storage_form() {
    let conn = MockConnection::new();
    let registry = ConnectionRegistry::new();
    let session = Session::new(&conn, &registry);

    let purchase = Purchase {
        id: Some(9),
        qty: 2,
        meta: Some(serde_json::json!({"gift": true})),
    };
    purchase.insert(&session).expect("insert");

    let executed = conn.last_statement().expect("statement");
    assert_eq!(
        executed.sql,
        "INSERT INTO `orders` (`id`, `qty`, `meta`) VALUES (?, ?, ?)"
    );
    assert_eq!(
        executed.values,
        vec![
            Value::from(9i64),
            Value::from(2i32),
            Value::from(r#"{"gift":true}"#.to_string())
        ]
    );
}

#[test]
fn test_update_targets_identity() {
    let conn = MockConnection::new();
    let registry = ConnectionRegistry::new();
    let session = Session::new(&conn, &registry);
    conn.set_affected_rows(1);

    let updated = alice(Some(3)).update(&session).expect("update");
    assert_eq!(updated, 1);

    let executed = conn.last_statement().expect("statement");
    assert_eq!(executed.sql, "UPDATE `users` SET `name` = ? WHERE `id` = ?");
    assert_eq!(executed.values, vec![Value::from("alice"), Value::from(3i64)]);
}

#[test]
fn test_save_picks_insert_or_update() {
    let conn = MockConnection::new();
    let registry = ConnectionRegistry::new();
    let session = Session::new(&conn, &registry);
    conn.set_last_insert_id(11i64);
    conn.set_affected_rows(1);

    assert_eq!(
        alice(None).save(&session),
        Ok(SaveOutcome::Inserted(Value::from(11i64)))
    );
    assert_eq!(alice(Some(11)).save(&session), Ok(SaveOutcome::Updated(1)));

    let statements: Vec<String> = conn.statements().into_iter().map(|s| s.sql).collect();
    assert!(statements[0].starts_with("INSERT INTO `users`"));
    assert!(statements[1].starts_with("UPDATE `users`"));
}

#[test]
fn test_delete_targets_identity() {
    let conn = MockConnection::new();
    let registry = ConnectionRegistry::new();
    let session = Session::new(&conn, &registry);

    alice(Some(4)).delete(&session).expect("delete");
    let executed = conn.last_statement().expect("statement");
    assert_eq!(executed.sql, "DELETE FROM `users` WHERE `id` = ?");
    assert_eq!(executed.values, vec![Value::from(4i64)]);
}

#[test]
fn test_missing_identity() {
    let conn = MockConnection::new();
    let registry = ConnectionRegistry::new();
    let session = Session::new(&conn, &registry);

    let missing = QueryError::MissingIdentity {
        table: "users".to_string(),
    };
    assert_eq!(alice(None).update(&session), Err(missing.clone()));
    assert_eq!(alice(None).delete(&session), Err(missing));

    let entry = AuditEntry {
        message: "login".to_string(),
    };
    assert_eq!(
        entry.save(&session),
        Err(QueryError::MissingIdentity {
            table: "audit_log".to_string()
        })
    );
    assert!(conn.statements().is_empty());
    assert!(conn.transaction_log().is_empty());

    // a keyless table can still be inserted into
    entry.insert(&session).expect("insert");
    assert_eq!(
        conn.last_statement().map(|s| s.sql),
        Some("INSERT INTO `audit_log` (`message`) VALUES (?)".to_string())
    );
}

#[test]
fn test_writes_join_the_callers_scope() {
    let conn = MockConnection::new();
    let registry = ConnectionRegistry::new();
    let session = Session::new(&conn, &registry);

    session
        .transaction(|s| {
            alice(None).insert(s)?;
            alice(Some(1)).delete(s)
        })
        .expect("transaction");
    assert_eq!(conn.statements().len(), 2);
    assert_eq!(conn.transaction_log(), vec!["BEGIN", "COMMIT"]);
}

#[test]
fn test_failed_write_rolls_back_outer_scope() {
    let conn = MockConnection::new();
    let registry = ConnectionRegistry::new();
    let session = Session::new(&conn, &registry);

    let result = session.transaction(|s| {
        alice(None).insert(s)?;
        conn.fail_next_prepare(DriverError::Write("deadlock".into()));
        alice(Some(1)).delete(s)
    });
    assert!(matches!(
        result,
        Err(QueryError::OperationFailed(DriverError::Write(_)))
    ));
    assert_eq!(conn.statements().len(), 1);
    assert_eq!(conn.transaction_log(), vec!["BEGIN", "ROLLBACK"]);
}
