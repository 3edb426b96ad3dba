//! # Event bus for session diagnostics.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. The session,
//! its channels' delivery tasks and the capture task publish into it; the
//! session owner observes it through [`Session::events`](crate::Session::events).
//!
//! ```text
//! Publishers:                       Observers:
//!   Session (lifecycle) ──┐
//!   delivery tasks      ──┼──► Bus ──► Session::events() receivers
//!   capture task        ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits for observers.
//! - **Bounded**: slow observers see `RecvError::Lagged(n)` and skip ahead.
//! - **No persistence**: events published with no observer are lost.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for session events. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current observers (drops it if there are none).
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// New receiver observing events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
