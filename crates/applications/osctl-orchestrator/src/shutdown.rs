//! Operator interrupt handling
//!
//! SIGINT (Ctrl+C) and SIGTERM cancel the same token the fail-fast
//! coordinator uses. Failovers already in progress are left to finish; the
//! process exits once the workers have returned.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Wait for SIGINT or SIGTERM
pub async fn wait_for_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut term = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res,
            _ = term.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

/// Cancel `cancel` when the operator interrupts the process.
///
/// The listener also ends quietly once the token is cancelled for another
/// reason (fail-fast), so it never outlives the job.
pub fn spawn_signal_listener(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            res = wait_for_signal() => {
                match res {
                    Ok(()) => {
                        cancel.cancel();
                        info!("Waiting for the existing operation to be finished...");
                    }
                    Err(e) => warn!(error = %e, "Failed to install signal handler"),
                }
            }
        }
    })
}
