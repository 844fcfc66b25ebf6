use std::cell::Cell;
use std::rc::Rc;

use thiserror::Error;
use well_engine::TransportError;

/// The two session kinds multiplexed onto the single message-handler slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    WordWell,
    Audio,
}

/// Lifecycle of one session, open to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Opening,
    Ready,
    Active,
}

/// Errors from session setup and the channel underneath it.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("presentation surface failed to open: {0}")]
    SurfaceUnavailable(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A scoped lease on the message-handler slot.
///
/// Acquired when a session opens and released on teardown; the `Drop` impl
/// guarantees release on every exit path, including abnormal host-level
/// close. Probes let tests and diagnostics observe whether the lease is
/// still held without keeping the session alive.
#[derive(Debug)]
pub struct SessionLease {
    held: Rc<Cell<bool>>,
}

impl SessionLease {
    pub fn acquire() -> Self {
        Self {
            held: Rc::new(Cell::new(true)),
        }
    }

    /// An observer handle for this lease.
    pub fn probe(&self) -> LeaseProbe {
        LeaseProbe {
            held: Rc::clone(&self.held),
        }
    }

    pub fn release(&mut self) {
        self.held.set(false);
    }

    pub fn is_held(&self) -> bool {
        self.held.get()
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.release();
    }
}

/// Read-only view on a [`SessionLease`].
#[derive(Debug, Clone)]
pub struct LeaseProbe {
    held: Rc<Cell<bool>>,
}

impl LeaseProbe {
    pub fn is_held(&self) -> bool {
        self.held.get()
    }
}

/// The explicit, ordered chain of installed message handlers.
///
/// Replaces the closure-wrapping the handler slot used to get: each session
/// kind registers on open and deregisters on teardown; dispatch walks from
/// the most recently registered handler and falls through on message types a
/// handler doesn't own, so nothing is dropped silently by an interposed
/// session.
#[derive(Debug, Default)]
pub struct HandlerChain {
    entries: Vec<SessionKind>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a handler at the top of the chain. Re-registering an already
    /// installed kind moves it to the top.
    pub fn register(&mut self, kind: SessionKind) {
        self.entries.retain(|k| *k != kind);
        self.entries.push(kind);
    }

    pub fn deregister(&mut self, kind: SessionKind) {
        self.entries.retain(|k| *k != kind);
    }

    /// Handlers in dispatch order, most recently registered first.
    pub fn dispatch_order(&self) -> Vec<SessionKind> {
        self.entries.iter().rev().copied().collect()
    }

    pub fn contains(&self, kind: SessionKind) -> bool {
        self.entries.contains(&kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
