//! Connection identity and the per-connection transaction registry.
//!
//! Every [`Connection`](crate::Connection) carries a process-local
//! [`ConnectionId`]. A [`ConnectionRegistry`] hands out one shared
//! [`TransactionStack`] per id, so independent code paths opening transaction
//! scopes on the same connection arbitrate through the same stack.
//!
//! The registry is an ordinary value: applications usually keep one for the
//! lifetime of their connections, tests build a fresh one per case.

use crate::transaction::TransactionStack;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-local opaque connection identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate an id no other connection in this process has
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared handle to a connection's transaction stack
pub type SharedStack = Rc<RefCell<TransactionStack>>;

/// Registry of transaction stacks, one per connection id
///
/// Stacks are created on first use and never evicted; connections are
/// expected to be long-lived.
#[derive(Default)]
pub struct ConnectionRegistry {
    stacks: RefCell<HashMap<ConnectionId, SharedStack>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stack of `id`, created on first request
    pub fn stack(&self, id: ConnectionId) -> SharedStack {
        let mut stacks = self.stacks.borrow_mut();
        Rc::clone(stacks.entry(id).or_insert_with(|| {
            log::debug!("Creating transaction stack for connection {id}");
            Rc::new(RefCell::new(TransactionStack::new()))
        }))
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.stacks.borrow().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.stacks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.borrow().is_empty()
    }
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("stacks", &self.len())
            .finish()
    }
}
