use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::consumers::Consume;
use crate::core::channel::{Step, step};
use crate::core::{Session, SessionState, ShutdownTrigger};
use crate::error::EngineError;
use crate::sources::Source;
use crate::views::{Parts, View, finish};

/// Reads the session directly on the task calling `present()`.
///
/// No channel is created; the view keeps its own cursor. A small watcher task
/// stops the session when the shutdown trigger fires, which ends the loop.
pub struct ForegroundView {
    parts: Parts,
}

impl ForegroundView {
    pub fn new(session: Arc<Session>, consumer: Arc<dyn Consume>) -> Self {
        Self {
            parts: Parts::new(session, consumer),
        }
    }

    /// Captures from `source` while presenting.
    #[must_use]
    pub fn with_source(self, source: impl Source) -> Self {
        *self.parts.source.lock() = Some(Box::new(source));
        self
    }

    #[must_use]
    pub fn with_shutdown(mut self, trigger: ShutdownTrigger) -> Self {
        self.parts.shutdown = trigger;
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.parts.session
    }
}

#[async_trait]
impl View for ForegroundView {
    async fn present(&self) -> Result<(), EngineError> {
        let session = &self.parts.session;
        self.parts.start()?;

        let mut cursor = session.cursor();
        let watcher = tokio::spawn(stop_on_trigger(
            Arc::clone(session),
            self.parts.shutdown.clone(),
        ));

        let consumer = &*self.parts.consumer;
        while session.is_running() {
            let stop = Some(session.token());
            match step(&mut cursor, consumer, session.bus(), None, stop).await {
                Step::Delivered => {}
                Step::Cancelled => break,
                Step::Idle => tokio::select! {
                    _ = session.halted() => break,
                    _ = cursor.wait() => {}
                },
            }
        }
        debug!(at = cursor.position(), "foreground reader finished");

        let trigger = match watcher.await {
            Ok(res) => res,
            Err(err) => {
                warn!(error = %err, "shutdown watcher ended abnormally");
                Ok(())
            }
        };
        finish(session, trigger).await
    }
}

async fn stop_on_trigger(session: Arc<Session>, trigger: ShutdownTrigger) -> std::io::Result<()> {
    let res = tokio::select! {
        res = trigger.wait() => res,
        _ = session.halted() => return Ok(()),
    };
    if session.state() == SessionState::Started {
        if let Err(err) = session.stop().await {
            debug!(error = %err, "session already stopping");
        }
    }
    res
}
