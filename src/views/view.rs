use async_trait::async_trait;

use crate::error::EngineError;

/// Something that presents a session's records until told to stop.
///
/// `present()` owns the whole lifecycle of its session: it starts it, feeds
/// its consumer, and leaves the session `Stopped` when it returns.
#[async_trait]
pub trait View: Send + Sync {
    /// Runs until the shutdown trigger fires or the producer faults.
    ///
    /// # Errors
    /// - [`EngineError::InvalidState`] if the session was already started;
    /// - [`EngineError::Producer`] if capture failed for good;
    /// - [`EngineError::Signal`] if the termination trigger could not be set up.
    async fn present(&self) -> Result<(), EngineError>;
}
