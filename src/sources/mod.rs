//! # Capture sources.
//!
//! A [`Source`] turns some capture stream into [`Captured`] items. The
//! session's capture task drives it (see `Session::start_with_source`).
//!
//! ## Provided sources
//! - [`FrameSource`]: length-prefixed record frames (files, pipes);
//! - [`LoggerEntrySource`]: Android `logger_entry` streams;
//! - [`DummySource`]: random one-liners at a fixed interval.

mod dummy;
mod frames;
mod logger;
mod source;

pub use dummy::{DEFAULT_INTERVAL, DummySource};
pub use frames::{FrameSource, MAX_FRAME_LEN, write_frame};
pub use logger::{ENTRY_HEADER_LEN, ENTRY_MAX_PAYLOAD, LoggerEntrySource};
pub use source::{Captured, Source};
pub(crate) use source::read_header;
