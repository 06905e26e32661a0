//! Integration tests for lifeguard-query
//!
//! Everything runs against `MockConnection`, which records the SQL and bound
//! values each operation produces and replays queued result sets.

mod common;

mod active_model;
mod aggregates;
mod config;
mod joint_query;
mod query_builder;
mod transactions;
