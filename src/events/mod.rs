//! Session events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Session` (lifecycle), channel delivery tasks (gaps,
//!   consumer panics), the capture task (malformed frames, retries, faults).
//! - **Consumers**: whoever owns the session, via `Session::events()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
