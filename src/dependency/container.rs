use std::sync::Arc;

use crate::middleware::Middleware;
use crate::resource::{Broker, CachePool, SqlDatabase};

use super::DependencyBuilder;

/// Immutable bundle of initialized resources shared by every feature module.
///
/// Built exactly once, after all resource initializers have run and before any
/// module constructor. No slot is ever reassigned; accessors hand out the same
/// handle on every call, so concurrent reads from any number of modules are
/// safe.
pub struct Dependency {
    pub(super) sql_database: Arc<dyn SqlDatabase>,
    pub(super) cache_pool: Arc<dyn CachePool>,
    pub(super) broker: Arc<dyn Broker>,
    pub(super) middleware: Arc<dyn Middleware>,
}

impl std::fmt::Debug for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependency").finish_non_exhaustive()
    }
}

impl Dependency {
    pub fn builder() -> DependencyBuilder {
        DependencyBuilder::new()
    }

    pub fn sql_database(&self) -> &Arc<dyn SqlDatabase> {
        &self.sql_database
    }

    pub fn cache_pool(&self) -> &Arc<dyn CachePool> {
        &self.cache_pool
    }

    pub fn broker(&self) -> &Arc<dyn Broker> {
        &self.broker
    }

    pub fn middleware(&self) -> &Arc<dyn Middleware> {
        &self.middleware
    }
}
