//! Error types used by the engine, the codec and capture sources.
//!
//! - [`EngineError`]: lifecycle violations and fatal producer faults, returned
//!   by the control surface.
//! - [`MalformedRecord`]: a frame that violates the wire layout; capture skips
//!   it and keeps going.
//! - [`ProducerFault`]: the capture source failed for good.
//! - [`SourceError`]: what a [`Source`](crate::Source) reports per read.
//!
//! A dropped-history gap is **not** an error: it reaches consumers through
//! [`Consume::on_gap`](crate::Consume::on_gap).
//!
//! All enums provide `as_label` (stable snake_case) for logs.

use thiserror::Error;

use crate::core::SessionState;

/// # Errors produced by the control surface.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EngineError {
    /// Operation attempted in the wrong lifecycle state.
    #[error("cannot {op} a session in state {state}")]
    InvalidState {
        /// Operation that was rejected (`start`, `stop`, ...).
        op: &'static str,
        /// State the session was in.
        state: SessionState,
    },

    /// The capture source failed unrecoverably; the session closed its channels.
    #[error(transparent)]
    Producer(#[from] ProducerFault),

    /// Termination-signal listeners could not be installed.
    #[error("signal registration failed: {0}")]
    Signal(#[from] std::io::Error),
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use logtap::{EngineError, SessionState};
    ///
    /// let err = EngineError::InvalidState { op: "start", state: SessionState::Started };
    /// assert_eq!(err.as_label(), "invalid_state");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::InvalidState { .. } => "invalid_state",
            EngineError::Producer(_) => "producer_fault",
            EngineError::Signal(_) => "signal_registration",
        }
    }

    /// True for lifecycle violations.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, EngineError::InvalidState { .. })
    }
}

/// # A frame that does not follow the record wire layout.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecord {
    /// Shorter than header + process-name field.
    #[error("frame of {len} bytes is shorter than the minimum {min}")]
    TooShort { len: usize, min: usize },

    /// A NUL-terminated string ran off the end of the frame.
    #[error("field `{field}` is not NUL terminated")]
    Unterminated { field: &'static str },

    /// Not enough bytes left for the fixed process-name field.
    #[error("process name needs {needed} bytes, {available} left")]
    Truncated { needed: usize, available: usize },

    /// Payload larger than the per-record limit.
    #[error("payload of {len} bytes exceeds {max}")]
    PayloadTooLarge { len: usize, max: usize },

    /// Length prefix / header announced something impossible.
    #[error("bad framing: {reason}")]
    Framing { reason: String },
}

impl MalformedRecord {
    pub fn as_label(&self) -> &'static str {
        match self {
            MalformedRecord::TooShort { .. } => "frame_too_short",
            MalformedRecord::Unterminated { .. } => "frame_unterminated",
            MalformedRecord::Truncated { .. } => "frame_truncated",
            MalformedRecord::PayloadTooLarge { .. } => "payload_too_large",
            MalformedRecord::Framing { .. } => "bad_framing",
        }
    }
}

/// # Unrecoverable failure of the capture source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("producer fault in '{origin}': {reason}")]
pub struct ProducerFault {
    /// Name of the source that failed.
    pub origin: &'static str,
    /// Last error reported by the source.
    pub reason: String,
}

/// # Errors reported by a capture source for a single read.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Worth retrying after a delay (device busy, interrupted read, ...).
    #[error("transient source error: {reason}")]
    Transient { reason: String },

    /// The source cannot produce anything anymore.
    #[error("fatal source error: {reason}")]
    Fatal { reason: String },
}

impl SourceError {
    pub fn as_label(&self) -> &'static str {
        match self {
            SourceError::Transient { .. } => "source_transient",
            SourceError::Fatal { .. } => "source_fatal",
        }
    }

    /// Returns `true` for [`SourceError::Transient`].
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Transient { .. })
    }

    pub fn reason(&self) -> &str {
        match self {
            SourceError::Transient { reason } | SourceError::Fatal { reason } => reason,
        }
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let reason = err.to_string();
        match err.kind() {
            ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut => {
                SourceError::Transient { reason }
            }
            _ => SourceError::Fatal { reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_classification() {
        let interrupted = std::io::Error::new(std::io::ErrorKind::Interrupted, "signal");
        assert!(SourceError::from(interrupted).is_retryable());

        let gone = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "device gone");
        let err = SourceError::from(gone);
        assert!(!err.is_retryable());
        assert_eq!(err.reason(), "device gone");
    }

    #[test]
    fn test_producer_fault_converts() {
        let fault = ProducerFault {
            origin: "frames",
            reason: "eof in header".into(),
        };
        let err: EngineError = fault.clone().into();
        assert_eq!(err.as_label(), "producer_fault");
        assert_eq!(err.to_string(), "producer fault in 'frames': eof in header");
    }
}
