//! Shared record storage.
//!
//! - [`RingBuffer`] bounded store with sequence-numbered slots
//! - [`Cursor`] independent reader position with event-driven waiting
//! - [`Read`] outcome of a non-blocking read (record, nothing yet, or gap)

mod ring;

pub use ring::{Capacity, Cursor, Read, RingBuffer};
