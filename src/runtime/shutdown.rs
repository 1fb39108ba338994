//! # Shutdown
//!
//! Process-wide shutdown flag fed by SIGINT/SIGTERM.

use tokio::sync::watch;
use tracing::{info, warn};

/// Create the shutdown channel; send `true` to request shutdown
#[must_use]
pub fn channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Resolve once shutdown has been requested (or the sender is gone)
pub async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    // Err means the sender was dropped, which is also the end of the process
    let _ = rx.wait_for(|requested| *requested).await;
}

/// Flip the shutdown flag on SIGINT or SIGTERM
pub fn spawn_signal_handler(tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");
        if tx.send(true).is_err() {
            warn!("No components are listening for shutdown");
        }
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
