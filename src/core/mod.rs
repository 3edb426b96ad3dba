//! Session engine: lifecycle, channels, capture and termination.
//!
//! - [`session`]: the [`Session`] state machine owning the ring buffer;
//! - [`channel`]: one subscriber with its own cursor and delivery task;
//! - [`capture`]: the task feeding a [`Source`](crate::Source) into the buffer;
//! - [`config`]: [`SessionConfig`] and its sentinels;
//! - [`shutdown`]: OS signal and token based termination triggers.

mod capture;
pub(crate) mod channel;
mod config;
mod session;
mod shutdown;
mod state;

pub use channel::{Channel, ChannelId};
pub use config::{DEFAULT_BUFFER_BYTES, SessionConfig, StartPosition};
pub use session::{Session, SessionStats};
pub use shutdown::{ShutdownTrigger, wait_for_shutdown_signal};
pub use state::SessionState;
