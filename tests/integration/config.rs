//! Configured grammar flowing through the builders

use crate::common::{Post, User};
use lifeguard_query::{col, Connection, Filterable, JointQuery, MockConnection, Model, QueryConfig};

fn ansi_config() -> QueryConfig {
    QueryConfig::from_toml(
        r#"
        [query]
        quote_style = "double_quote"
        aggregate_alias = "total"
        "#,
    )
    .expect("valid config")
}

#[test]
fn test_configured_quote_style() {
    let config = ansi_config();
    let conn = MockConnection::with_grammar(config.grammar());

    let stmt = User::query()
        .filter("name", "=", "alice")
        .and_then(|q| q.build(conn.grammar()))
        .expect("build");
    assert_eq!(stmt.sql(), r#"SELECT * FROM "users" WHERE "name" = ?"#);

    let stmt = JointQuery::new::<User>()
        .configure(&config)
        .inner_join::<Post, _>(|scope| scope.on("users.id", "=", col("posts.user_id")))
        .and_then(|q| q.build(conn.grammar()))
        .expect("build");
    assert!(
        stmt.sql()
            .ends_with(r#"INNER JOIN "posts" ON "users"."id" = "posts"."user_id""#),
        "{}",
        stmt.sql()
    );
}

#[test]
fn test_configured_aggregate_alias_is_quoted() {
    let config = ansi_config();
    let conn = MockConnection::with_grammar(config.grammar());

    let count = User::query().configure(&config).count(&conn).expect("count");
    assert_eq!(count, 0);
    assert_eq!(
        conn.last_statement().map(|s| s.sql),
        Some(r#"SELECT COUNT(*) AS "total" FROM "users""#.to_string())
    );
}
