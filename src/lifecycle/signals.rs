//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGTERM / SIGINT
//! - Translate the first signal into a graceful shutdown
//! - Force exit on a second signal while draining

use crate::lifecycle::Shutdown;

/// Which signal ended the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Interrupt => write!(f, "SIGINT"),
            Signal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Resolve on the next termination signal.
#[cfg(unix)]
pub async fn wait_for_signal() -> std::io::Result<Signal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res.map(|_| Signal::Interrupt),
        _ = terminate.recv() => Ok(Signal::Terminate),
    }
}

#[cfg(not(unix))]
pub async fn wait_for_signal() -> std::io::Result<Signal> {
    tokio::signal::ctrl_c().await.map(|_| Signal::Interrupt)
}

/// Spawn the signal watcher: the first signal triggers `shutdown`, a second
/// one exits the process immediately.
pub fn spawn_signal_handler(shutdown: Shutdown) {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(signal) => {
                tracing::warn!(%signal, "Signal received, shutting down gracefully");
                shutdown.trigger();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handlers");
                return;
            }
        }

        if let Ok(signal) = wait_for_signal().await {
            tracing::error!(%signal, "Second signal received, exiting immediately");
            std::process::exit(1);
        }
    });
}
