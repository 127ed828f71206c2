//! Last-request-wins bookkeeping for async requests that can overlap, such as
//! camera opens racing with facing switches and closes.

use std::cell::Cell;

/// Identifies one request issued through a [`RequestGate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

/// Outcome of a request once it resolves.
#[derive(Debug, PartialEq)]
pub enum Settled<T, E> {
    /// Still the latest request; the result applies.
    Current(Result<T, E>),
    /// A newer request or a cancel was issued meanwhile; the result, success
    /// or failure, must not touch shared state.
    Superseded,
}

#[derive(Debug, Default)]
pub struct RequestGate {
    generation: Cell<u64>,
}

impl RequestGate {
    /// Issue a new request, superseding every earlier one.
    pub fn begin(&self) -> Ticket {
        Ticket(self.bump())
    }

    /// Supersede every outstanding request without issuing a new one.
    pub fn cancel(&self) {
        self.bump();
    }

    #[inline]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation.get() == ticket.0
    }

    pub fn settle<T, E>(&self, ticket: Ticket, result: Result<T, E>) -> Settled<T, E> {
        if self.is_current(ticket) {
            Settled::Current(result)
        } else {
            Settled::Superseded
        }
    }

    fn bump(&self) -> u64 {
        let g = self.generation.get().wrapping_add(1);
        self.generation.set(g);
        g
    }
}
