//! Convenience macros.
//!
//! - `lifeguard_txn!` - run a block inside a session transaction scope

mod txn;
