//! Graceful Shutdown Handler
//!
//! Resolves when the process is asked to stop, so the HTTP server can
//! finish in-flight resolutions before exiting.

use std::future::Future;

/// Wait for Ctrl+C or SIGTERM.
///
/// Falls back to waiting forever if the signal handlers cannot be installed,
/// leaving the process to be killed the hard way.
#[cfg_attr(coverage_nightly, coverage(off))]
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    wait_for_first(ctrl_c, terminate).await;
}

/// Resolve on whichever shutdown source fires first.
async fn wait_for_first<A, B>(ctrl_c: A, terminate: B)
where
    A: Future<Output = ()>,
    B: Future<Output = ()>,
{
    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, shutting down");
        }
    }
}
