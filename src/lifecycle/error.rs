use std::fmt;

use crate::dependency::DependencyKind;

/// A single failed close, attributed to its resource kind.
#[derive(Debug)]
pub struct ShutdownFailure {
    pub kind: DependencyKind,
    pub error: anyhow::Error,
}

/// Aggregate outcome of draining the closer registry.
///
/// Close failures are non-fatal: every registered handle is attempted and
/// every failure is recorded, so operators see all of them instead of the
/// first. Whether an unclean report fails the process exit code is the
/// caller's decision.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    attempted: usize,
    failures: Vec<ShutdownFailure>,
}

impl ShutdownReport {
    pub(crate) fn record_attempt(&mut self) {
        self.attempted += 1;
    }

    pub(crate) fn record_failure(&mut self, failure: ShutdownFailure) {
        self.failures.push(failure);
    }

    pub fn attempted(&self) -> usize {
        self.attempted
    }

    pub fn failures(&self) -> &[ShutdownFailure] {
        &self.failures
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for ShutdownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "all {} resources closed cleanly", self.attempted);
        }
        write!(
            f,
            "{} of {} resource closes failed",
            self.failures.len(),
            self.attempted
        )?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.kind, failure.error)?;
        }
        Ok(())
    }
}
