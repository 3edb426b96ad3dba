//! # Record consumers.
//!
//! Provides the [`Consume`] trait and a reference terminal [`Printer`].
//!
//! ## Architecture
//! ```text
//! RingBuffer ──► Channel delivery task ──► Consume::on_record(&Record)
//!                        │                 Consume::on_gap(dropped)
//!                        └──► panic caught → EventKind::ConsumerPanicked
//! ```

mod consume;
mod printer;

pub use consume::{Consume, ConsumeFn};
pub use printer::{Printer, format_line};
