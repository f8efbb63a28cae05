// Signal handling module
//
// SIGTERM and SIGINT (Ctrl+C) request a graceful shutdown of the accept loop.

use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Spawn a task that notifies `shutdown` once a termination signal arrives
#[cfg(unix)]
pub fn spawn_shutdown_listener(shutdown: Arc<Notify>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                logger::log_error(&format!("Failed to register SIGTERM handler: {e}"));
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => logger::log_info("SIGTERM received, shutting down"),
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => logger::log_info("SIGINT received, shutting down"),
                Err(e) => {
                    logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
                    return;
                }
            },
        }

        // notify_one stores a permit, so a signal between loop iterations is not lost
        shutdown.notify_one();
    });
}

/// Non-unix fallback: Ctrl+C only
#[cfg(not(unix))]
pub fn spawn_shutdown_listener(shutdown: Arc<Notify>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                logger::log_info("Ctrl+C received, shutting down");
                shutdown.notify_one();
            }
            Err(e) => logger::log_error(&format!("Failed to listen for Ctrl+C: {e}")),
        }
    });
}
