//! # logtap
//!
//! **logtap** distributes a live stream of captured log records to any number
//! of independently paced consumers.
//!
//! A single producer appends [`Record`]s into a bounded [`RingBuffer`] that
//! overwrites its oldest entries. Each consumer reads through its own
//! [`Channel`] with a private cursor and delivery task: a slow consumer never
//! blocks the producer or the other consumers, and when it falls out of the
//! retention window it is told how many records it lost (a *gap*).
//!
//! ## Architecture
//! ```text
//!  ┌─────────────────────────────────────────┐
//!  │ Source (frames / logger_entry / dummy)  │
//!  └───────────────────┬─────────────────────┘
//!                      ▼ capture task (retry with backoff, faults)
//! ┌────────────────────────────────────────────────────────────────────┐
//! │ Session                                                            │
//! │  - state machine  Created → Started → Stopped → Destroyed          │
//! │  - RingBuffer     [ first ......................... next )         │
//! │  - Bus            diagnostic events (gaps, faults, lifecycle)      │
//! │  - open channels  one lock shared by create / close / stop         │
//! └──────┬──────────────────┬──────────────────┬───────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐       ┌──────────┐       ┌────────────────┐
//!   │ Channel  │       │ Channel  │       │ ForegroundView │
//!   │ cursor   │       │ cursor   │       │ cursor         │
//!   │ task     │       │ task     │       │ (caller task)  │
//!   └────┬─────┘       └────┬─────┘       └──────┬─────────┘
//!        ▼                  ▼                    ▼
//!   Consume::on_record / Consume::on_gap(dropped)
//! ```
//!
//! ## Delivery guarantees
//! - Per channel: producer order, no duplicates, no reordering.
//! - Across channels: no ordering relation.
//! - A lagging reader receives `on_gap(n)` and resumes at the oldest retained
//!   record; loss is never silent.
//! - `Channel::close()` and `Session::stop()` return only once the affected
//!   delivery tasks exited.
//!
//! ## Features
//! | Area             | Description                                        | Key types                                  |
//! |------------------|----------------------------------------------------|--------------------------------------------|
//! | **Records**      | Log record model and its binary wire format         | [`Record`], [`Level`], [`encode`], [`decode`] |
//! | **Buffer**       | Overwrite-on-full store with per-reader cursors     | [`RingBuffer`], [`Cursor`], [`Read`]       |
//! | **Engine**       | Session lifecycle, channels, capture task           | [`Session`], [`Channel`], [`SessionConfig`] |
//! | **Consumers**    | Callback trait and a terminal printer               | [`Consume`], [`ConsumeFn`], [`Printer`]    |
//! | **Views**        | End-to-end presentation of a session                | [`View`], [`ForegroundView`], [`ChannelView`] |
//! | **Sources**      | Producer-side adapters                              | [`Source`], [`FrameSource`], [`LoggerEntrySource`], [`DummySource`] |
//! | **Events**       | Diagnostic event stream                             | [`Event`], [`EventKind`]                   |
//! | **Errors**       | Typed errors with stable labels                     | [`EngineError`], [`MalformedRecord`], [`SourceError`] |
//!
//! ## Optional features
//! - `cli` (default): builds the `logtap` binary.
//!
//! ## Example
//! ```rust
//! use logtap::{ConsumeFn, Record, Session, SessionConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), logtap::EngineError> {
//!     let session = Session::new(SessionConfig::with_slots(1024));
//!     session.start()?;
//!
//!     let channel = session.create_channel(ConsumeFn::arc("stdout", |rec: &Record| {
//!         println!("{}: {}", rec.tag(), rec.text());
//!     }))?;
//!
//!     session.append(Record::new(1, 1).with_tag("demo").with_text("hello"))?;
//!
//!     channel.close().await;
//!     session.stop().await?;
//!     session.destroy()?;
//!     Ok(())
//! }
//! ```

mod buffer;
mod consumers;
mod core;
mod error;
mod events;
mod policies;
mod record;
mod sources;
mod views;

// ---- Public re-exports ----

pub use buffer::{Capacity, Cursor, Read, RingBuffer};
pub use consumers::{Consume, ConsumeFn, Printer, format_line};
pub use crate::core::{
    Channel, ChannelId, DEFAULT_BUFFER_BYTES, Session, SessionConfig, SessionState, SessionStats,
    ShutdownTrigger, StartPosition, wait_for_shutdown_signal,
};
pub use error::{EngineError, MalformedRecord, ProducerFault, SourceError};
pub use events::{Bus, Event, EventKind};
pub use policies::{Jitter, RetryPolicy};
pub use record::{
    HEADER_LEN, Level, MAX_PAYLOAD, MIN_FRAME_LEN, PNAME_DISPLAY_WIDTH, PNAME_LEN, ProcessName,
    Record, decode, encode, encoded_len,
};
pub use sources::{
    Captured, DEFAULT_INTERVAL, DummySource, ENTRY_HEADER_LEN, ENTRY_MAX_PAYLOAD, FrameSource,
    LoggerEntrySource, MAX_FRAME_LEN, Source, write_frame,
};
pub use views::{ChannelView, ForegroundView, View};
