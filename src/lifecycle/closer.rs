use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::dependency::DependencyKind;
use crate::resource::Closer;

use super::{ShutdownFailure, ShutdownReport};

/// Tracks every live resource handle for coordinated shutdown.
///
/// Append-only while the loader runs, drain-only afterwards. Once registered,
/// a handle is owned here and partial registrations are never undone: a handle
/// acquired before a later startup failure is either closed by an explicit
/// drain or abandoned with the fatally-failed process.
#[derive(Default)]
pub struct CloserRegistry {
    handles: Vec<Arc<dyn Closer>>,
}

impl CloserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handle: Arc<dyn Closer>) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn kinds(&self) -> Vec<DependencyKind> {
        self.handles.iter().map(|h| h.kind()).collect()
    }

    /// Drains every handle in reverse registration order (last acquired,
    /// first released). Each close is bounded by `timeout`; a failure or
    /// timeout never skips the remaining handles.
    pub async fn close_all(&mut self, timeout: Duration) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        for handle in self.handles.drain(..).rev() {
            let kind = handle.kind();
            report.record_attempt();
            match tokio::time::timeout(timeout, handle.close()).await {
                Ok(Ok(())) => info!(%kind, "resource closed"),
                Ok(Err(err)) => {
                    error!(%kind, error = %err, "resource close failed");
                    report.record_failure(ShutdownFailure { kind, error: err });
                }
                Err(_) => {
                    error!(%kind, "resource close timed out");
                    report.record_failure(ShutdownFailure {
                        kind,
                        error: anyhow::anyhow!("close timed out after {timeout:?}"),
                    });
                }
            }
        }
        report
    }
}
