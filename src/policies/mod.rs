//! Capture retry policy.
//!
//! ## Contents
//! - [`RetryPolicy`] delay growth (first / factor / max) and retry budget
//! - [`Jitter`] randomization strategy for delays
//!
//! ## Quick wiring
//! ```text
//! SessionConfig { retry: RetryPolicy, .. }
//!      └─► core::capture uses:
//!           - retry.allows(failures) to decide retry vs ProducerFault
//!           - retry.delay(failures) to schedule the next read
//! ```

mod retry;

pub use retry::{Jitter, RetryPolicy};
