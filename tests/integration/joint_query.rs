//! Multi-table selects split back into per-table models

use crate::common::{Post, User};
use lifeguard_query::{
    col, Connection, Filterable, JoinKind, JointQuery, MockConnection, Order, QueryConfig,
    QueryError, Row, Value,
};

fn user_posts() -> Result<JointQuery, QueryError> {
    JointQuery::new::<User>()
        .inner_join::<Post, _>(|scope| scope.on("users.id", "=", col("posts.user_id")))
}

#[test]
fn test_columns_are_selected_under_synthetic_aliases() {
    let conn = MockConnection::new();
    let stmt = user_posts()
        .and_then(|q| q.filter("posts.title", "like", "Rust%"))
        .map(|q| q.order_by("posts.id", Order::Desc))
        .and_then(|q| q.build(conn.grammar()))
        .expect("build");

    assert_eq!(
        stmt.sql(),
        "SELECT `users`.`id` AS `jc_1`, `users`.`name` AS `jc_2`, \
         `posts`.`id` AS `jc_3`, `posts`.`user_id` AS `jc_4`, `posts`.`title` AS `jc_5` \
         FROM `users` INNER JOIN `posts` ON `users`.`id` = `posts`.`user_id` \
         WHERE `posts`.`title` LIKE ? ORDER BY `posts`.`id` DESC"
    );
    assert_eq!(stmt.values(), &[Value::from("Rust%")]);
}

#[test]
fn test_rows_hydrate_one_model_per_table() {
    let conn = MockConnection::new();
    conn.push_result(vec![Row::new()
        .with("jc_1", 1i64)
        .with("jc_2", "alice")
        .with("jc_3", "10")
        .with("jc_4", 1i64)
        .with("jc_5", "Hello")]);

    let records = user_posts()
        .and_then(|q| q.list(&conn))
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .expect("list");

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.len(), 2);
    assert_eq!(
        record.get::<User>(),
        Some(&User {
            id: Some(1),
            name: "alice".to_string()
        })
    );
    assert_eq!(
        record.get::<Post>(),
        Some(&Post {
            id: Some(10),
            user_id: 1,
            title: "Hello".to_string()
        })
    );
}

#[test]
fn test_unmatched_outer_join_table_is_absent() {
    let conn = MockConnection::new();
    conn.push_result(vec![Row::new()
        .with("jc_1", 2i64)
        .with("jc_2", "bob")
        .with("jc_3", Value::BigInt(None))
        .with("jc_4", Value::BigInt(None))
        .with("jc_5", Value::String(None))]);

    let mut record = JointQuery::new::<User>()
        .left_join::<Post, _>(|scope| scope.on("users.id", "=", col("posts.user_id")))
        .and_then(|q| q.first(&conn))
        .expect("first")
        .expect("row");

    assert!(record.contains::<User>());
    assert!(!record.contains::<Post>());
    assert_eq!(record.take::<User>().map(|u| u.name), Some("bob".to_string()));

    let sql = conn.last_statement().map(|s| s.sql).unwrap_or_default();
    assert!(sql.contains("LEFT JOIN `posts` ON"), "{sql}");
    assert!(sql.ends_with("LIMIT 1"), "{sql}");
}

#[test]
fn test_cross_join_has_no_on_clause() {
    let conn = MockConnection::new();
    let stmt = JointQuery::new::<User>()
        .join::<Post, _>(JoinKind::Cross, |scope| scope.on("users.id", "=", col("posts.user_id")))
        .and_then(|q| q.build(conn.grammar()))
        .expect("build");
    assert!(stmt.sql().ends_with("FROM `users` CROSS JOIN `posts`"), "{}", stmt.sql());
}

#[test]
fn test_explicit_aliased_columns_are_routed() {
    let conn = MockConnection::new();
    conn.push_result(vec![Row::new()
        .with("author", "carol")
        .with("uid", 4i64)
        .with("post_count", 3i64)]);

    let record = JointQuery::new::<User>()
        .inner_join::<Post, _>(|scope| scope.on("users.id", "=", col("posts.user_id")))
        .map(|q| {
            q.select([
                col("users.id").alias("uid"),
                col("users.name").alias("author"),
                col("post_count"),
            ])
        })
        .and_then(|q| q.first(&conn))
        .expect("first")
        .expect("row");

    assert_eq!(
        record.get::<User>(),
        Some(&User {
            id: Some(4),
            name: "carol".to_string()
        })
    );
    assert!(!record.contains::<Post>());
    assert_eq!(
        conn.last_statement().map(|s| s.sql),
        Some(
            "SELECT `users`.`id` AS `uid`, `users`.`name` AS `author`, `post_count` \
             FROM `users` INNER JOIN `posts` ON `users`.`id` = `posts`.`user_id` LIMIT 1"
                .to_string()
        )
    );
}

#[test]
fn test_configured_alias_prefix() {
    let conn = MockConnection::new();
    let config = QueryConfig {
        joint_alias_prefix: "col_".to_string(),
        ..QueryConfig::default()
    };
    let stmt = user_posts()
        .map(|q| q.configure(&config))
        .and_then(|q| q.build(conn.grammar()))
        .expect("build");
    assert!(stmt.sql().starts_with("SELECT `users`.`id` AS `col_1`"), "{}", stmt.sql());
    assert!(stmt.sql().contains("`posts`.`title` AS `col_5`"), "{}", stmt.sql());
}
