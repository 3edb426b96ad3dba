//! # Session lifecycle states.
//!
//! ```text
//! Created ──start()──► Started ──stop()──► Stopped ──destroy()──► Destroyed
//!                                                       ▲             │
//!                                                       └─ destroy() ─┘ (no-op)
//! ```
//! Every other transition is rejected with
//! [`EngineError::InvalidState`](crate::EngineError::InvalidState).

use std::fmt;

use crate::error::EngineError;

/// Lifecycle state of a [`Session`](crate::Session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Created,
    Started,
    Stopped,
    Destroyed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Created => "created",
            SessionState::Started => "started",
            SessionState::Stopped => "stopped",
            SessionState::Destroyed => "destroyed",
        }
    }

    /// Requires `self == expected`, naming `op` in the error otherwise.
    #[inline]
    pub(crate) fn require(
        self,
        expected: SessionState,
        op: &'static str,
    ) -> Result<(), EngineError> {
        if self == expected {
            Ok(())
        } else {
            Err(EngineError::InvalidState { op, state: self })
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
