//! # Diagnostic events emitted by a session.
//!
//! The [`EventKind`] enum classifies what happened inside the engine:
//! - **Lifecycle events**: session start/stop/destroy, channel open/close
//! - **Delivery events**: dropped history (gaps), consumer panics
//! - **Capture events**: malformed frames, source retries, producer faults
//!
//! The [`Event`] struct carries optional metadata (channel, consumer name,
//! dropped count, reason, retry attempt/delay) depending on the kind.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically across all sessions of the process.
//!
//! ## Example
//! ```rust
//! use logtap::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RecordsDropped)
//!     .with_consumer("printer")
//!     .with_dropped(17);
//!
//! assert_eq!(ev.kind, EventKind::RecordsDropped);
//! assert_eq!(ev.consumer.as_deref(), Some("printer"));
//! assert_eq!(ev.dropped, Some(17));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::ChannelId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of session events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Session lifecycle ===
    /// Session moved to `Started`.
    SessionStarted,

    /// Session moved to `Stopped`; every channel is closed.
    SessionStopped,

    /// Session resources were released.
    SessionDestroyed,

    // === Channel lifecycle ===
    /// A channel was created and its delivery task spawned.
    ///
    /// Sets:
    /// - `channel`, `consumer`
    ChannelOpened,

    /// A channel's delivery task exited.
    ///
    /// Sets:
    /// - `channel`, `consumer`
    ChannelClosed,

    // === Delivery ===
    /// A reader fell behind the retention window and lost history.
    ///
    /// Sets:
    /// - `channel` (absent for foreground readers), `consumer`
    /// - `dropped`: number of records lost
    RecordsDropped,

    /// A consumer callback panicked; delivery continued with the next record.
    ///
    /// Sets:
    /// - `channel`, `consumer`
    /// - `reason`: panic message
    ConsumerPanicked,

    // === Capture ===
    /// The source produced a frame that does not decode; it was skipped.
    ///
    /// Sets:
    /// - `reason`: decode error
    MalformedFrame,

    /// The source reported a transient error; capture retries after a delay.
    ///
    /// Sets:
    /// - `attempt`, `delay_ms`, `reason`
    SourceRetry,

    /// The source reached the end of its stream.
    SourceExhausted,

    /// The source failed for good; all channels are being closed.
    ///
    /// Sets:
    /// - `reason`
    ProducerFault,
}

/// Session event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Channel concerned, if any.
    pub channel: Option<ChannelId>,
    /// Consumer name, if any.
    pub consumer: Option<Arc<str>>,
    /// Records lost by a lagging reader.
    pub dropped: Option<u64>,
    /// Human-readable reason (errors, panic messages).
    pub reason: Option<Arc<str>>,
    /// Consecutive failed reads (retry events).
    pub attempt: Option<u32>,
    /// Delay before the next read attempt in milliseconds.
    pub delay_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            channel: None,
            consumer: None,
            dropped: None,
            reason: None,
            attempt: None,
            delay_ms: None,
        }
    }

    #[inline]
    pub fn with_channel(mut self, id: ChannelId) -> Self {
        self.channel = Some(id);
        self
    }

    #[inline]
    pub fn with_consumer(mut self, name: impl Into<Arc<str>>) -> Self {
        self.consumer = Some(name.into());
        self
    }

    #[inline]
    pub fn with_dropped(mut self, n: u64) -> Self {
        self.dropped = Some(n);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a retry delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Gap event for a lagging reader.
    pub fn records_dropped(channel: Option<ChannelId>, consumer: &str, dropped: u64) -> Self {
        let ev = Event::new(EventKind::RecordsDropped)
            .with_consumer(consumer)
            .with_dropped(dropped);
        match channel {
            Some(id) => ev.with_channel(id),
            None => ev,
        }
    }

    /// Panic report for a consumer callback.
    pub fn consumer_panicked(channel: Option<ChannelId>, consumer: &str, info: String) -> Self {
        let ev = Event::new(EventKind::ConsumerPanicked)
            .with_consumer(consumer)
            .with_reason(info);
        match channel {
            Some(id) => ev.with_channel(id),
            None => ev,
        }
    }

    #[inline]
    pub fn is_gap(&self) -> bool {
        matches!(self.kind, EventKind::RecordsDropped)
    }
}
