//! Transaction Module
//!
//! Nested logical transaction scopes arbitrated onto one physical transaction
//! per connection. This is not savepoint nesting: the outermost scope begins
//! the physical transaction, and when the last scope is released it commits
//! only if every scope accepted, in order. Any scope that fails to accept, or
//! is released out of order, dooms the whole transaction to roll back.
//!
//! This module provides:
//! - [`TransactionStack`] - per-connection bookkeeping and arbitration
//! - [`Transaction`] - handle for one logical scope, released exactly once

use crate::connection::{ConnectionRegistry, SharedStack};
use crate::error::QueryError;
use crate::executor::{Connection, DriverError};
use std::fmt;
use std::rc::Rc;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// Callback told whether the physical transaction committed
pub type CompletionListener = Box<dyn FnOnce(bool)>;

/// Outcome of the release that ended a physical transaction
///
/// Listeners are handed back to the caller instead of being run inside the
/// stack, so they may open new scopes on the same connection.
#[must_use = "completion listeners only run when notified"]
pub struct Completion {
    committed: bool,
    listeners: Vec<CompletionListener>,
}

impl Completion {
    pub fn committed(&self) -> bool {
        self.committed
    }

    /// Run every listener once with the outcome
    pub fn notify(self) -> bool {
        for listener in self.listeners {
            listener(self.committed);
        }
        self.committed
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("committed", &self.committed)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Per-connection nested transaction arbitration
///
/// Depth 0 is idle. [`acquire`](Self::acquire) opens a scope and returns its
/// index (the new depth); the scope is expected to [`accept`](Self::accept)
/// and then [`release`](Self::release) with that index. Bookkeeping never
/// fails; only the physical BEGIN, COMMIT and ROLLBACK can.
#[derive(Default)]
pub struct TransactionStack {
    depth: usize,
    accepted: Option<bool>,
    accepted_stack: Vec<Option<bool>>,
    block_accept: bool,
    listeners: Vec<CompletionListener>,
}

impl TransactionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether the current physical transaction is doomed to roll back
    pub fn is_blocked(&self) -> bool {
        self.block_accept
    }

    /// Open a scope, beginning the physical transaction at depth 0
    ///
    /// # Errors
    ///
    /// Propagates a failed BEGIN; the stack is left unchanged.
    pub fn acquire(&mut self, connection: &dyn Connection) -> Result<usize, DriverError> {
        if self.depth == 0 {
            #[cfg(feature = "tracing")]
            let _span = tracing_helpers::begin_transaction_span().entered();

            connection.begin_transaction()?;
            log::debug!("BEGIN on connection {}", connection.id());
        }
        self.accepted_stack.push(self.accepted);
        self.accepted = None;
        self.depth += 1;
        Ok(self.depth)
    }

    /// Mark scope `index` as accepted
    ///
    /// Ignored unless `index` is the innermost open scope.
    pub fn accept(&mut self, index: usize) {
        if index == self.depth && self.depth > 0 {
            self.accepted = Some(true);
        } else {
            log::debug!("Ignoring stale accept of scope {index} at depth {}", self.depth);
        }
    }

    /// Mark scope `index` as rejected
    pub fn reject(&mut self, index: usize) {
        if index == self.depth && self.depth > 0 {
            self.accepted = Some(false);
        }
    }

    /// Register a listener for the end of the current physical transaction
    pub fn on_complete(&mut self, listener: CompletionListener) {
        self.listeners.push(listener);
    }

    /// Close scope `index`
    ///
    /// Releasing out of order, or without having accepted, latches the stack
    /// so the physical transaction rolls back. When depth returns to 0 the
    /// transaction is committed or rolled back and the returned [`Completion`]
    /// carries the outcome and the pending listeners.
    ///
    /// # Errors
    ///
    /// Propagates a failed COMMIT or ROLLBACK. The stack is idle afterwards
    /// and the pending listeners are dropped without being notified.
    pub fn release(
        &mut self,
        connection: &dyn Connection,
        index: usize,
    ) -> Result<Option<Completion>, DriverError> {
        if self.depth == 0 {
            log::warn!("Ignoring release of scope {index} with no open transaction");
            return Ok(None);
        }
        if index != self.depth || self.accepted != Some(true) {
            self.block_accept = true;
        }
        self.depth -= 1;

        if self.depth > 0 {
            self.accepted = self.accepted_stack.pop().flatten();
            return Ok(None);
        }

        let committed = !self.block_accept;
        let listeners = std::mem::take(&mut self.listeners);
        self.block_accept = false;
        self.accepted = None;
        self.accepted_stack.clear();

        if committed {
            #[cfg(feature = "tracing")]
            let _span = tracing_helpers::commit_transaction_span().entered();
            connection.commit()?;
            log::debug!("COMMIT on connection {}", connection.id());
        } else {
            #[cfg(feature = "tracing")]
            let _span = tracing_helpers::rollback_transaction_span().entered();
            connection.rollback()?;
            log::debug!("ROLLBACK on connection {}", connection.id());
        }

        #[cfg(feature = "metrics")]
        METRICS.record_transaction(committed);

        Ok(Some(Completion {
            committed,
            listeners,
        }))
    }
}

impl fmt::Debug for TransactionStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionStack")
            .field("depth", &self.depth)
            .field("accepted", &self.accepted)
            .field("accepted_stack", &self.accepted_stack)
            .field("block_accept", &self.block_accept)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// One logical transaction scope on a connection
///
/// Acquired by [`begin`](Self::begin) and released exactly once, either
/// explicitly through [`release`](Self::release) or when dropped. A scope that
/// is dropped without [`accept`](Self::accept) makes the physical transaction
/// roll back.
///
/// # Example
///
/// ```
/// use lifeguard_query::{ConnectionRegistry, MockConnection, Transaction};
///
/// let conn = MockConnection::new();
/// let registry = ConnectionRegistry::new();
///
/// let tx = Transaction::begin(&registry, &conn).unwrap();
/// // ... writes ...
/// tx.accept();
/// assert_eq!(tx.release().unwrap(), Some(true));
/// assert_eq!(conn.transaction_log(), vec!["BEGIN", "COMMIT"]);
/// ```
pub struct Transaction<'c> {
    connection: &'c dyn Connection,
    stack: SharedStack,
    index: usize,
    released: bool,
}

impl<'c> Transaction<'c> {
    /// Open a scope on `connection`
    pub fn begin(
        registry: &ConnectionRegistry,
        connection: &'c dyn Connection,
    ) -> Result<Self, QueryError> {
        let stack = registry.stack(connection.id());
        let index = stack.borrow_mut().acquire(connection)?;
        Ok(Self {
            connection,
            stack,
            index,
            released: false,
        })
    }

    /// Depth of this scope
    pub fn depth(&self) -> usize {
        self.index
    }

    pub fn accept(&self) {
        self.stack.borrow_mut().accept(self.index);
    }

    pub fn reject(&self) {
        self.stack.borrow_mut().reject(self.index);
    }

    /// Run `listener` once the physical transaction ends
    pub fn on_complete(&self, listener: impl FnOnce(bool) + 'static) {
        self.stack.borrow_mut().on_complete(Box::new(listener));
    }

    /// Close the scope
    ///
    /// Returns `Some(committed)` if this release ended the physical
    /// transaction, `None` while outer scopes remain open.
    pub fn release(mut self) -> Result<Option<bool>, QueryError> {
        self.release_scope()
    }

    fn release_scope(&mut self) -> Result<Option<bool>, QueryError> {
        self.released = true;
        let completion = self
            .stack
            .borrow_mut()
            .release(self.connection, self.index)?;
        // the stack borrow has ended; listeners may open new scopes
        Ok(completion.map(Completion::notify))
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.release_scope() {
            log::warn!(
                "Failed to release transaction scope {} on connection {}: {e}",
                self.index,
                self.connection.id()
            );
        }
    }
}

impl fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("connection", &self.connection.id())
            .field("index", &self.index)
            .field("released", &self.released)
            .field("shared", &Rc::strong_count(&self.stack))
            .finish()
    }
}
