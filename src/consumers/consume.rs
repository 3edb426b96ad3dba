//! # Record consumer trait.
//!
//! [`Consume`] is the extension point through which records leave the engine.
//! Each open [`Channel`](crate::Channel) drives exactly one consumer from its
//! own delivery task.
//!
//! ## Contract
//! - Calls arrive sequentially and in producer order; the next call starts
//!   only after the previous one returned.
//! - A slow consumer only delays itself. When it falls behind the ring
//!   buffer's retention window it gets [`Consume::on_gap`] with the number
//!   of records it lost, then continues from the oldest retained record.
//! - Panics are caught and reported as `EventKind::ConsumerPanicked`;
//!   delivery goes on with the next record.
//!
//! ## Example
//! ```rust
//! use logtap::{Consume, Record};
//! use async_trait::async_trait;
//!
//! struct ErrorsOnly;
//!
//! #[async_trait]
//! impl Consume for ErrorsOnly {
//!     async fn on_record(&self, rec: &Record) {
//!         if rec.level() >= logtap::Level::Error {
//!             eprintln!("{}: {}", rec.tag(), rec.text());
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "errors-only" }
//! }
//! ```

use async_trait::async_trait;

use crate::record::Record;

/// Receiver of delivered records.
#[async_trait]
pub trait Consume: Send + Sync + 'static {
    /// Handles one record.
    ///
    /// Called from the channel's delivery task, never concurrently with
    /// another callback of the same channel.
    async fn on_record(&self, record: &Record);

    /// Reports that `dropped` records were lost because this consumer fell
    /// behind. The default logs a warning.
    async fn on_gap(&self, dropped: u64) {
        tracing::warn!(consumer = self.name(), dropped, "records dropped due to slow consumption");
    }

    /// Name used in logs and session events.
    ///
    /// The default uses `type_name::<Self>()`; override it with something short.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Consumer built from a synchronous closure.
///
/// # Example
/// ```rust
/// use logtap::{ConsumeFn, Record};
///
/// let printer = ConsumeFn::arc("stdout", |rec: &Record| println!("{}", rec.text()));
/// # let _ = printer;
/// ```
pub struct ConsumeFn<F> {
    name: &'static str,
    f: F,
}

impl<F> ConsumeFn<F>
where
    F: Fn(&Record) + Send + Sync + 'static,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }

    /// Shorthand for `Arc::new(ConsumeFn::new(..))`.
    pub fn arc(name: &'static str, f: F) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F> Consume for ConsumeFn<F>
where
    F: Fn(&Record) + Send + Sync + 'static,
{
    async fn on_record(&self, record: &Record) {
        (self.f)(record);
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
