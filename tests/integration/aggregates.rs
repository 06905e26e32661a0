//! Aggregates, bulk updates, deletes and truncation

use crate::common::{Purchase, User};
use lifeguard_query::{
    Filterable, MockConnection, Model, Operand, Order, QueryConfig, QueryError, Row, Value,
};

#[test]
fn test_count_ignores_ordering_and_paging() {
    let conn = MockConnection::new();
    conn.push_result(vec![Row::new().with("aggregate", "12")]);

    let count = User::query()
        .filter("name", "like", "a%")
        .map(|q| q.order_by("id", Order::Desc).limit(3).offset(6))
        .and_then(|q| q.count(&conn))
        .expect("count");
    assert_eq!(count, 12);

    let executed = conn.last_statement().expect("statement");
    assert_eq!(
        executed.sql,
        "SELECT COUNT(*) AS `aggregate` FROM `users` WHERE `name` LIKE ?"
    );
    assert_eq!(executed.values, vec![Value::from("a%")]);
}

#[test]
fn test_count_without_rows_is_zero() {
    let conn = MockConnection::new();
    assert_eq!(User::query().count(&conn), Ok(0));
}

#[test]
fn test_avg_is_cast_to_float() {
    let conn = MockConnection::new();
    conn.push_result(vec![Row::new().with("aggregate", "2.5")]);
    let avg = Purchase::query().avg(&conn, "qty").expect("avg");
    assert_eq!(avg, Value::from(2.5f64));
    assert_eq!(
        conn.last_statement().map(|s| s.sql),
        Some("SELECT AVG(`qty`) AS `aggregate` FROM `orders`".to_string())
    );
}

#[test]
fn test_max_returns_raw_value() {
    let conn = MockConnection::new();
    conn.push_result(vec![Row::new().with("aggregate", 40i32)]);
    let max = Purchase::query().max(&conn, "qty").expect("max");
    assert_eq!(max, Value::from(40i32));
}

#[test]
fn test_configured_aggregate_alias() {
    let conn = MockConnection::new();
    let config = QueryConfig {
        aggregate_alias: "agg_value".to_string(),
        ..QueryConfig::default()
    };
    conn.push_result(vec![Row::new().with("agg_value", 9i64)]);

    let total = User::query().configure(&config).count(&conn).expect("count");
    assert_eq!(total, 9);
    assert_eq!(
        conn.last_statement().map(|s| s.sql),
        Some("SELECT COUNT(*) AS `agg_value` FROM `users`".to_string())
    );
}

#[test]
fn test_update_casts_assignments() {
    let conn = MockConnection::new();
    conn.set_affected_rows(2);

    let updated = Purchase::query()
        .filter("id", "in", vec![1i64, 2])
        .and_then(|q| q.update(&conn, vec![("qty", Operand::from("5")), ("meta", Operand::Null)]))
        .expect("update");
    assert_eq!(updated, 2);

    let executed = conn.last_statement().expect("statement");
    assert_eq!(
        executed.sql,
        "UPDATE `orders` SET `qty` = ?, `meta` = NULL WHERE `id` IN (?, ?)"
    );
    assert_eq!(
        executed.values,
        vec![Value::from(5i32), Value::from(1i64), Value::from(2i64)]
    );
}

#[test]
fn test_update_without_assignments_is_skipped() {
    let conn = MockConnection::new();
    let updated = User::query()
        .update(&conn, Vec::<(&str, Operand)>::new())
        .expect("update");
    assert_eq!(updated, 0);
    assert!(conn.statements().is_empty());
}

#[test]
fn test_update_rejects_list_assignments() {
    let conn = MockConnection::new();
    let result = User::query().update(&conn, vec![("name", Operand::from(vec!["a", "b"]))]);
    assert!(matches!(result, Err(QueryError::UnsupportedValue { .. })));
    assert!(conn.statements().is_empty());
}

#[test]
fn test_delete_and_truncate() {
    let conn = MockConnection::new();
    conn.set_affected_rows(1);

    let deleted = User::query()
        .filter_eq("name", "alice")
        .and_then(|q| q.delete(&conn))
        .expect("delete");
    assert_eq!(deleted, 1);
    assert_eq!(
        conn.last_statement().map(|s| s.sql),
        Some("DELETE FROM `users` WHERE `name` = ?".to_string())
    );

    User::query().truncate(&conn).expect("truncate");
    assert_eq!(
        conn.last_statement().map(|s| s.sql),
        Some("TRUNCATE TABLE `users`".to_string())
    );
}
