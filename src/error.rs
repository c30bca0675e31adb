use thiserror::Error;

use crate::dependency::DependencyKind;
use crate::resource::Endpoint;

pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Fatal startup errors.
///
/// Every variant terminates the bootstrap sequence: a service must never run
/// with a silently-missing dependency. The composition root decides process
/// termination and exit code; nothing in this crate exits the process itself.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("missing required configuration key `{0}`")]
    MissingConfig(&'static str),

    #[error("invalid value for configuration key `{key}`: {reason}")]
    InvalidConfig { key: &'static str, reason: String },

    #[error("{kind} ({endpoint}): connection failed: {source}")]
    Connection {
        kind: DependencyKind,
        endpoint: Endpoint,
        #[source]
        source: anyhow::Error,
    },

    #[error("dependency `{0}` was never initialized")]
    MissingDependency(DependencyKind),

    #[error("dependency `{0}` supplied twice")]
    DuplicateDependency(DependencyKind),

    #[error("startup canceled while initializing `{0}`")]
    Canceled(DependencyKind),
}

impl BootstrapError {
    /// Wrap an underlying client error, attributed to a resource kind and endpoint.
    pub fn connection(
        kind: DependencyKind,
        endpoint: Endpoint,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Connection {
            kind,
            endpoint,
            source: source.into(),
        }
    }
}
