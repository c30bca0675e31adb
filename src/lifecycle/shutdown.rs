//! Graceful shutdown plumbing.
//!
//! Listens for OS signals and drains the service's closer registry.

use std::time::Duration;

use tokio::signal;
use tracing::{error, info};

use crate::service::Service;

use super::ShutdownReport;

const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns the running service and coordinates its graceful shutdown.
///
/// Blocks until SIGTERM or ctrl-c, then drains every registered resource with
/// a bounded per-close timeout. The returned report lets the caller decide
/// whether an unclean shutdown should fail the process exit code.
pub struct ShutdownHandler {
    service: Service,
    close_timeout: Duration,
}

impl ShutdownHandler {
    pub fn new(service: Service) -> Self {
        Self {
            service,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }

    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub async fn wait_for_shutdown(self) -> ShutdownReport {
        shutdown_signal().await;
        info!(service = %self.service.name(), "starting graceful shutdown");
        let report = self.service.shutdown(self.close_timeout).await;
        if report.is_clean() {
            info!(%report, "graceful shutdown complete");
        } else {
            error!(%report, "graceful shutdown finished with failures");
        }
        report
    }
}

/// Completes when SIGTERM or ctrl-c is received.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received ctrl-c");
        },
        _ = terminate => {
            info!("received SIGTERM");
        },
    }
}
