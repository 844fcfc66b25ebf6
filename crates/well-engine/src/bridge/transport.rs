use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use crate::bridge::protocol::WireMessage;

/// Transport failure modes. Sends are fire-and-forget at the application
/// level; the only hard error is a peer that no longer exists.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer endpoint is closed")]
    Closed,
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One direction of the channel: a FIFO of encoded messages plus an open
/// flag shared by both endpoints.
struct Pipe {
    queue: VecDeque<Value>,
    open: bool,
}

impl Pipe {
    fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            queue: VecDeque::new(),
            open: true,
        }))
    }
}

/// One end of an in-memory message channel modelling the host⇄surface
/// boundary.
///
/// Messages are encoded to JSON on send and decoded on receive, so the wire
/// format is exercised even in-process. Delivery is in send order per
/// direction; there is no cross-direction ordering guarantee, matching the
/// real boundary. Closing either endpoint closes the whole channel.
pub struct Endpoint {
    outgoing: Rc<RefCell<Pipe>>,
    incoming: Rc<RefCell<Pipe>>,
}

impl Endpoint {
    /// Create a connected endpoint pair: (host side, surface side).
    pub fn pair() -> (Endpoint, Endpoint) {
        let a_to_b = Pipe::new();
        let b_to_a = Pipe::new();
        (
            Endpoint {
                outgoing: Rc::clone(&a_to_b),
                incoming: Rc::clone(&b_to_a),
            },
            Endpoint {
                outgoing: b_to_a,
                incoming: a_to_b,
            },
        )
    }

    /// Queue a message for the peer. Fire-and-forget: there is no delivery
    /// acknowledgment beyond explicit application-level replies.
    pub fn send(&self, msg: &WireMessage) -> Result<(), TransportError> {
        let mut pipe = self.outgoing.borrow_mut();
        if !pipe.open {
            return Err(TransportError::Closed);
        }
        pipe.queue.push_back(msg.to_wire()?);
        Ok(())
    }

    /// Pop the next delivered message, if any.
    pub fn recv(&self) -> Option<WireMessage> {
        let value = self.incoming.borrow_mut().queue.pop_front()?;
        Some(WireMessage::from_wire(value))
    }

    /// Drain everything currently delivered, in send order.
    pub fn drain(&self) -> Vec<WireMessage> {
        let mut out = Vec::new();
        while let Some(msg) = self.recv() {
            out.push(msg);
        }
        out
    }

    /// Tear the channel down. Undelivered messages are discarded; the peer's
    /// sends start failing with [`TransportError::Closed`].
    pub fn close(&self) {
        for pipe in [&self.outgoing, &self.incoming] {
            let mut pipe = pipe.borrow_mut();
            pipe.open = false;
            pipe.queue.clear();
        }
    }

    pub fn is_open(&self) -> bool {
        self.outgoing.borrow().open && self.incoming.borrow().open
    }
}
