//! # Termination triggers for views.
//!
//! [`ShutdownTrigger`] tells a view when to tear its session down: on an OS
//! termination signal (default) or when a [`CancellationToken`] fires.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT`
//!
//! **Other platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

use tokio_util::sync::CancellationToken;

/// What ends a view's `present()`.
#[derive(Clone, Debug, Default)]
pub enum ShutdownTrigger {
    /// OS termination signals.
    #[default]
    Signals,
    /// An external token; used by embedders and tests.
    Token(CancellationToken),
}

impl ShutdownTrigger {
    /// Completes when the trigger fires.
    ///
    /// Returns `Err` if signal registration fails.
    pub async fn wait(&self) -> std::io::Result<()> {
        match self {
            ShutdownTrigger::Signals => wait_for_shutdown_signal().await,
            ShutdownTrigger::Token(token) => {
                token.cancelled().await;
                Ok(())
            }
        }
    }
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = sigint.recv()  => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    tracing::info!(signal = name, "termination signal received");
    Ok(())
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!(signal = "ctrl-c", "termination signal received");
    Ok(())
}
