//! # Session configuration.
//!
//! Provides [`SessionConfig`], the settings fixed at session creation.
//!
//! ## Sentinel values
//! - `buffer_bytes = 0` → no byte budget (only `buffer_slots` applies)
//! - `buffer_slots = 0` → no slot cap (only `buffer_bytes` applies)
//! - both `0` → [`DEFAULT_BUFFER_BYTES`]

use crate::buffer::Capacity;
use crate::policies::RetryPolicy;

/// Default record storage per session (1 MiB).
pub const DEFAULT_BUFFER_BYTES: usize = 1024 * 1024;

/// Where a new reader starts in the ring buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StartPosition {
    /// Replay everything still retained, then follow live records.
    #[default]
    Oldest,
    /// Only records appended after the reader was created.
    Latest,
}

/// Configuration of a [`Session`](crate::Session).
///
/// ## Field semantics
/// - `buffer_bytes`: byte budget of the ring buffer (`0` = none)
/// - `buffer_slots`: record cap of the ring buffer (`0` = none)
/// - `start_position`: where channel and foreground cursors begin
/// - `bus_capacity`: diagnostic event bus size (min 1)
/// - `retry`: how the capture task handles transient source errors
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Maximum encoded bytes retained by the ring buffer.
    pub buffer_bytes: usize,

    /// Maximum number of records retained by the ring buffer.
    pub buffer_slots: usize,

    /// Starting point of new readers.
    pub start_position: StartPosition,

    /// Capacity of the diagnostic event bus.
    ///
    /// Observers lagging behind more than `bus_capacity` events skip ahead.
    pub bus_capacity: usize,

    /// Retry policy of the capture task.
    pub retry: RetryPolicy,
}

impl SessionConfig {
    /// Config with a record-count budget only.
    pub fn with_slots(slots: usize) -> Self {
        Self {
            buffer_bytes: 0,
            buffer_slots: slots,
            ..Self::default()
        }
    }

    /// Ring buffer budget derived from the two sentinel fields.
    #[inline]
    pub fn capacity(&self) -> Capacity {
        if self.buffer_bytes == 0 && self.buffer_slots == 0 {
            Capacity::bytes(DEFAULT_BUFFER_BYTES)
        } else {
            Capacity {
                bytes: self.buffer_bytes,
                slots: self.buffer_slots,
            }
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SessionConfig {
    /// - `buffer_bytes = 1 MiB`
    /// - `buffer_slots = 0` (no cap)
    /// - `start_position = Oldest`
    /// - `bus_capacity = 1024`
    /// - `retry = RetryPolicy::default()`
    fn default() -> Self {
        Self {
            buffer_bytes: DEFAULT_BUFFER_BYTES,
            buffer_slots: 0,
            start_position: StartPosition::Oldest,
            bus_capacity: 1024,
            retry: RetryPolicy::default(),
        }
    }
}
