//! Test models shared by the integration tests

use lifeguard_query::{Attributes, CastType, ColumnSchema, Model, QueryError, TableSchema};
use once_cell::sync::Lazy;

static USERS: Lazy<TableSchema> = Lazy::new(|| {
    TableSchema::new("users")
        .with_column(ColumnSchema::new("id").cast(CastType::BigInteger).primary_key())
        .with_column(ColumnSchema::new("name").cast(CastType::String))
});

static POSTS: Lazy<TableSchema> = Lazy::new(|| {
    TableSchema::new("posts")
        .with_column(ColumnSchema::new("id").cast(CastType::BigInteger).primary_key())
        .with_column(ColumnSchema::new("user_id").cast(CastType::BigInteger))
        .with_column(ColumnSchema::new("title").cast(CastType::String))
});

static ORDERS: Lazy<TableSchema> = Lazy::new(|| {
    TableSchema::new("orders")
        .with_column(ColumnSchema::new("id").cast(CastType::BigInteger).primary_key())
        .with_column(ColumnSchema::new("qty").cast(CastType::Integer))
        .with_column(ColumnSchema::new("meta").cast(CastType::Json))
});

static AUDIT_LOG: Lazy<TableSchema> =
    Lazy::new(|| TableSchema::new("audit_log").with_column(ColumnSchema::new("message")));

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
}

impl Model for User {
    fn schema() -> &'static TableSchema {
        &USERS
    }

    fn hydrate(mut attributes: Attributes) -> Result<Self, QueryError> {
        Ok(Self {
            id: attributes.take("id")?,
            name: attributes.take("name")?,
        })
    }

    fn attributes(&self) -> Attributes {
        Attributes::new()
            .with("id", self.id)
            .with("name", self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: Option<i64>,
    pub user_id: i64,
    pub title: String,
}

impl Model for Post {
    fn schema() -> &'static TableSchema {
        &POSTS
    }

    fn hydrate(mut attributes: Attributes) -> Result<Self, QueryError> {
        Ok(Self {
            id: attributes.take("id")?,
            user_id: attributes.take("user_id")?,
            title: attributes.take("title")?,
        })
    }

    fn attributes(&self) -> Attributes {
        Attributes::new()
            .with("id", self.id)
            .with("user_id", self.user_id)
            .with("title", self.title.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub id: Option<i64>,
    pub qty: i32,
    pub meta: Option<serde_json::Value>,
}

impl Model for Purchase {
    fn schema() -> &'static TableSchema {
        &ORDERS
    }

    fn hydrate(mut attributes: Attributes) -> Result<Self, QueryError> {
        Ok(Self {
            id: attributes.take("id")?,
            qty: attributes.take("qty")?,
            meta: attributes.take("meta")?,
        })
    }

    fn attributes(&self) -> Attributes {
        Attributes::new()
            .with("id", self.id)
            .with("qty", self.qty)
            .with("meta", self.meta.clone())
    }
}

/// Table without a primary key
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub message: String,
}

impl Model for AuditEntry {
    fn schema() -> &'static TableSchema {
        &AUDIT_LOG
    }

    fn hydrate(mut attributes: Attributes) -> Result<Self, QueryError> {
        Ok(Self {
            message: attributes.take("message")?,
        })
    }

    fn attributes(&self) -> Attributes {
        Attributes::new().with("message", self.message.clone())
    }
}
