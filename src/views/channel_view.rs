use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::consumers::Consume;
use crate::core::{Session, ShutdownTrigger};
use crate::error::EngineError;
use crate::sources::Source;
use crate::views::{Parts, View, finish};

/// Delivers through one [`Channel`](crate::Channel) while the caller waits
/// for the shutdown trigger.
///
/// On termination the channel is closed first, then the session is stopped.
pub struct ChannelView {
    parts: Parts,
}

impl ChannelView {
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
impl View for ChannelView {
    async fn present(&self) -> Result<(), EngineError> {
        let session = &self.parts.session;
        self.parts.start()?;

        let channel = match session.create_channel(Arc::clone(&self.parts.consumer)) {
            Ok(channel) => channel,
            Err(err) => {
                finish(session, Ok(())).await?;
                return Err(err);
            }
        };

        let trigger = tokio::select! {
            res = self.parts.shutdown.wait() => res,
            _ = session.halted() => Ok(()),
        };

        info!(channel = %channel.id(), "closing channel");
        channel.close().await;
        finish(session, trigger).await
    }
}
