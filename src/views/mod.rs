//! # Views: ready-made ways to present a session.
//!
//! A [`View`] runs a session end to end for one consumer:
//!
//! ```text
//! ForegroundView::present()                ChannelView::present()
//!   start session (+ capture)                start session (+ capture)
//!   cursor read loop on this task            create_channel(consumer)
//!     ├─ on_record / on_gap                  wait: trigger | session halted
//!     └─ until stopped or faulted            close channel
//!   watcher: trigger → stop session          stop session
//!   stop session (if still running)          fault? → EngineError::Producer
//!   fault? → EngineError::Producer
//! ```

mod channel_view;
mod foreground;
mod view;

pub use channel_view::ChannelView;
pub use foreground::ForegroundView;
pub use view::View;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::consumers::Consume;
use crate::core::{Session, SessionState, ShutdownTrigger};
use crate::error::EngineError;
use crate::sources::Source;

/// What every view is built from.
struct Parts {
    session: Arc<Session>,
    consumer: Arc<dyn Consume>,
    source: Mutex<Option<Box<dyn Source>>>,
    shutdown: ShutdownTrigger,
}

impl Parts {
    fn new(session: Arc<Session>, consumer: Arc<dyn Consume>) -> Self {
        Self {
            session,
            consumer,
            source: Mutex::new(None),
            shutdown: ShutdownTrigger::default(),
        }
    }

    /// Starts the session, with a capture task if a source was given.
    fn start(&self) -> Result<(), EngineError> {
        let source = self.source.lock().take();
        match source {
            Some(source) => self.session.start_with_source(source),
            None => self.session.start(),
        }
    }
}

/// Stops the session if nobody did yet and turns the outcome into the
/// result of `present()`.
async fn finish(session: &Session, trigger: std::io::Result<()>) -> Result<(), EngineError> {
    if session.state() == SessionState::Started {
        match session.stop().await {
            Ok(()) => {}
            Err(err) if err.is_invalid_state() => debug!("session stopped concurrently"),
            Err(err) => return Err(err),
        }
    }
    if let Some(fault) = session.fault() {
        return Err(EngineError::Producer(fault));
    }
    trigger?;
    Ok(())
}
