//! SELECT rendering, condition trees and row hydration

use crate::common::{Post, Purchase, User};
use lifeguard_query::{
    col, raw, Connection, DriverError, Filterable, MockConnection, Model, Operand, Order, QueryError,
    Row, Value,
};

#[test]
fn test_or_filters_render_in_order() {
    let conn = MockConnection::new();
    let stmt = User::query()
        .filter("name", "=", "alice")
        .and_then(|q| q.or_filter("name", "=", "bob"))
        .and_then(|q| q.build(conn.grammar()))
        .expect("build");

    assert_eq!(stmt.sql(), "SELECT * FROM `users` WHERE `name` = ? OR `name` = ?");
    assert_eq!(stmt.values(), &[Value::from("alice"), Value::from("bob")]);
}

#[test]
fn test_groups_are_parenthesized() {
    let conn = MockConnection::new();
    let stmt = User::query()
        .filter("id", ">", 10i64)
        .and_then(|q| {
            q.filter_group(|g| g.filter("name", "like", "a%")?.or_filter("name", "like", "b%"))
        })
        .and_then(|q| q.build(conn.grammar()))
        .expect("build");

    assert_eq!(
        stmt.sql(),
        "SELECT * FROM `users` WHERE `id` > ? AND (`name` LIKE ? OR `name` LIKE ?)"
    );
    assert!(User::query().conditions().is_empty());
}

#[test]
fn test_single_condition_group_is_not_wrapped() {
    let conn = MockConnection::new();
    let stmt = User::query()
        .filter_group(|g| g.filter("name", "=", "alice"))
        .and_then(|q| q.build(conn.grammar()))
        .expect("build");
    assert_eq!(stmt.sql(), "SELECT * FROM `users` WHERE `name` = ?");
}

#[test]
fn test_negations() {
    let conn = MockConnection::new();
    let stmt = User::query()
        .filter_not("name", "=", "alice")
        .and_then(|q| q.filter_not_group(|g| g.filter("id", ">", 1i64)?.filter("id", "<", 9i64)))
        .and_then(|q| q.build(conn.grammar()))
        .expect("build");

    assert_eq!(
        stmt.sql(),
        "SELECT * FROM `users` WHERE `name` <> ? AND NOT (`id` > ? AND `id` < ?)"
    );
}

#[test]
fn test_null_comparisons() {
    let conn = MockConnection::new();
    let stmt = User::query()
        .filter("name", "=", Operand::Null)
        .and_then(|q| q.filter_eq("id", "!="))
        .and_then(|q| q.filter("name", ">", ()))
        .and_then(|q| q.build(conn.grammar()))
        .expect("build");

    assert_eq!(
        stmt.sql(),
        "SELECT * FROM `users` WHERE `name` IS NULL AND `id` IS NOT NULL AND `name` > NULL"
    );
    assert!(stmt.values().is_empty());

    let err = User::query()
        .filter("id", "in", Operand::Null)
        .and_then(|q| q.build(conn.grammar()))
        .unwrap_err();
    assert!(matches!(err, QueryError::UnsupportedValue { .. }));
}

#[test]
fn test_membership_values_are_cast() {
    let conn = MockConnection::new();
    let stmt = Purchase::query()
        .filter("qty", "in", vec!["1", "2", "3"])
        .and_then(|q| q.build(conn.grammar()))
        .expect("build");

    assert_eq!(stmt.sql(), "SELECT * FROM `orders` WHERE `qty` IN (?, ?, ?)");
    assert_eq!(
        stmt.values(),
        &[Value::from(1i32), Value::from(2i32), Value::from(3i32)]
    );
}

#[test]
fn test_membership_shape_errors() {
    let conn = MockConnection::new();

    let empty = Purchase::query()
        .filter("qty", "in", Vec::<i32>::new())
        .and_then(|q| q.build(conn.grammar()));
    assert!(matches!(empty, Err(QueryError::UnsupportedValue { .. })));

    let scalar = Purchase::query()
        .filter("qty", "not in", 3)
        .and_then(|q| q.build(conn.grammar()));
    assert!(matches!(scalar, Err(QueryError::UnsupportedValue { .. })));

    let list_without_in = Purchase::query()
        .filter("qty", "=", vec![1, 2])
        .and_then(|q| q.build(conn.grammar()));
    assert!(matches!(list_without_in, Err(QueryError::UnsupportedValue { .. })));
}

#[test]
fn test_subquery_values_are_spliced_in_order() {
    let conn = MockConnection::new();
    let authors = Post::query()
        .select(["user_id"])
        .filter("title", "like", "Rust%")
        .expect("subquery");

    let stmt = User::query()
        .filter("name", "<>", "admin")
        .and_then(|q| q.filter("id", "in", authors))
        .and_then(|q| q.filter("id", "<", 100i64))
        .and_then(|q| q.build(conn.grammar()))
        .expect("build");

    assert_eq!(
        stmt.sql(),
        "SELECT * FROM `users` WHERE `name` <> ? AND `id` IN \
         (SELECT `user_id` FROM `posts` WHERE `title` LIKE ?) AND `id` < ?"
    );
    assert_eq!(
        stmt.values(),
        &[Value::from("admin"), Value::from("Rust%"), Value::from(100i64)]
    );
}

#[test]
fn test_column_comparisons_bind_nothing() {
    let conn = MockConnection::new();
    let stmt = Post::query()
        .filter("id", ">", col("user_id"))
        .and_then(|q| q.build(conn.grammar()))
        .expect("build");
    assert_eq!(stmt.sql(), "SELECT * FROM `posts` WHERE `id` > `user_id`");
    assert!(stmt.values().is_empty());
}

#[test]
fn test_placeholders_match_values() {
    let conn = MockConnection::new();
    let statements = vec![
        User::query().build(conn.grammar()),
        User::query()
            .filter("name", "like", "%a%")
            .and_then(|q| q.or_filter_group(|g| g.filter("id", "in", vec![1i64, 2, 3])))
            .and_then(|q| q.build(conn.grammar())),
        Post::query()
            .filter_not("title", "in", vec!["a", "b"])
            .and_then(|q| q.filter_eq("user_id", 5i64))
            .and_then(|q| q.build(conn.grammar())),
    ];

    for stmt in statements {
        let stmt = stmt.expect("build");
        assert_eq!(stmt.placeholder_count(), stmt.values().len(), "{}", stmt.sql());
        assert!(stmt.is_balanced());
    }
}

#[test]
fn test_argument_errors_are_raised_while_building() {
    assert!(matches!(
        User::query().filter("name", "~~", "x"),
        Err(QueryError::UnsupportedOperator(_))
    ));
    assert!(matches!(
        User::query().filter("", "=", "x"),
        Err(QueryError::UnsupportedColumn(_))
    ));
}

#[test]
fn test_ordering_and_paging() {
    let conn = MockConnection::new();
    let stmt = User::query()
        .order_by("name", Order::Asc)
        .order_by("id", Order::Desc)
        .limit(10)
        .offset(20)
        .build(conn.grammar())
        .expect("build");
    assert_eq!(
        stmt.sql(),
        "SELECT * FROM `users` ORDER BY `name` ASC, `id` DESC LIMIT 10 OFFSET 20"
    );
}

#[test]
fn test_list_hydrates_models() {
    let conn = MockConnection::new();
    conn.push_result(vec![
        Row::new().with("id", 1i64).with("name", "alice"),
        Row::new().with("id", "2").with("name", "bob"),
    ]);

    let users = User::query()
        .filter("name", "<>", "carol")
        .and_then(|q| q.list(&conn))
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .expect("list");

    assert_eq!(
        users,
        vec![
            User {
                id: Some(1),
                name: "alice".to_string()
            },
            User {
                id: Some(2),
                name: "bob".to_string()
            },
        ]
    );
    let executed = conn.last_statement().expect("statement");
    assert_eq!(executed.sql, "SELECT * FROM `users` WHERE `name` <> ?");
    assert_eq!(executed.values, vec![Value::from("carol")]);
}

#[test]
fn test_raw_fragment_with_quoted_question_mark_runs() {
    let conn = MockConnection::new();
    conn.push_result(vec![Row::new().with("id", 3i64).with("name", "bob")]);

    let users = User::query()
        .filter(raw("CONCAT(`name`, '?')"), "=", "bob?")
        .and_then(|q| q.list(&conn))
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .expect("list");

    assert_eq!(users.len(), 1);
    let executed = conn.last_statement().expect("statement");
    assert_eq!(
        executed.sql,
        "SELECT * FROM `users` WHERE CONCAT(`name`, '?') = ?"
    );
    assert_eq!(executed.values, vec![Value::from("bob?")]);
}

#[test]
fn test_first_limits_to_one_row() {
    let conn = MockConnection::new();
    conn.push_result(vec![Row::new().with("id", 7i64).with("name", "alice")]);

    let user = User::query()
        .filter("name", "=", "alice")
        .and_then(|q| q.limit(5).first(&conn))
        .expect("first");
    assert_eq!(user.map(|u| u.id), Some(Some(7)));
    assert_eq!(
        conn.last_statement().map(|s| s.sql),
        Some("SELECT * FROM `users` WHERE `name` = ? LIMIT 1".to_string())
    );

    // nothing queued: no row
    assert_eq!(User::query().first(&conn).expect("first"), None);
}

#[test]
fn test_hydration_applies_schema_casts() {
    let conn = MockConnection::new();
    conn.push_result(vec![Row::new()
        .with("id", 3i64)
        .with("qty", "4")
        .with("meta", r#"{"gift":true}"#)]);

    let purchase = Purchase::query()
        .first(&conn)
        .expect("first")
        .expect("row");
    assert_eq!(purchase.qty, 4);
    assert_eq!(purchase.meta, Some(serde_json::json!({"gift": true})));
}

#[test]
fn test_reset_selection_refuses_models() {
    let conn = MockConnection::new();
    let query = User::query().select(["name"]);

    assert!(query.is_selection_reset());
    assert!(matches!(query.list(&conn).err(), Some(QueryError::SelectionReset)));
    assert!(matches!(query.first(&conn), Err(QueryError::SelectionReset)));
    assert!(conn.statements().is_empty());
}

#[test]
fn test_records_return_dynamic_rows() {
    let conn = MockConnection::new();
    conn.push_result(vec![Row::new().with("name", "alice").with("posts", "3")]);

    let records = User::query()
        .select(["name"])
        .add_select(col("post_count").select(Some("posts"), Some(lifeguard_query::CastType::Integer)))
        .records(&conn)
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .expect("records");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get::<String>("name"), Ok("alice".to_string()));
    assert_eq!(records[0].get::<i32>("posts"), Ok(3));
    assert_eq!(
        conn.last_statement().map(|s| s.sql),
        Some("SELECT `name`, `post_count` AS `posts` FROM `users`".to_string())
    );
}

#[test]
fn test_extra_selection_keeps_model_columns() {
    let conn = MockConnection::new();
    let stmt = User::query()
        .add_select(col("name").alias("display_name"))
        .build(conn.grammar())
        .expect("build");
    assert_eq!(stmt.sql(), "SELECT `users`.*, `name` AS `display_name` FROM `users`");
}

#[test]
fn test_prepare_failures_are_wrapped() {
    let conn = MockConnection::new();

    conn.fail_next_prepare(DriverError::Read("connection reset".into()));
    assert!(matches!(
        User::query().list(&conn).err(),
        Some(QueryError::OperationFailed(DriverError::Read(_)))
    ));

    conn.fail_next_prepare(DriverError::Other("syntax error".into()));
    assert!(matches!(
        User::query().first(&conn),
        Err(QueryError::Driver(DriverError::Other(_)))
    ));
}
