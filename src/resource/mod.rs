pub mod broker;
pub mod cache;
pub mod sql;

pub use broker::{Broker, BrokerError, BrokerSettings, KafkaBroker, publish_json};
pub use cache::{CacheError, CachePool, CacheSettings, RedisCachePool};
pub use sql::{SqlDatabase, SqlDatabasePair, SqlDriver, SqlEndpointSettings, SqlSettings};

use async_trait::async_trait;
use strum_macros::Display;

use crate::dependency::DependencyKind;

/// Which endpoint of a resource a connection error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Endpoint {
    Read,
    Write,
    Primary,
}

/// Base capability of every live resource handle.
///
/// Kind-specific access (read/write pools, cache commands, publish) is layered
/// on top as super-traited capabilities; the closer registry only ever sees
/// this surface.
#[async_trait]
pub trait Closer: Send + Sync {
    fn kind(&self) -> DependencyKind;

    /// Release the underlying connection(s). Failures are reported, not
    /// swallowed: the registry aggregates them without skipping siblings.
    async fn close(&self) -> anyhow::Result<()>;
}
