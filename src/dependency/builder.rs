use std::sync::Arc;

use crate::error::BootstrapError;
use crate::middleware::Middleware;
use crate::resource::{Broker, CachePool, SqlDatabase};

use super::{Dependency, DependencyKind};

/// One initialized component destined for a container slot.
///
/// Resource initializer steps return these explicitly; the loader collects
/// them into a list that is folded into the builder. Options are
/// order-independent because each one fills a disjoint slot.
pub enum DependencyOption {
    SqlDatabase(Arc<dyn SqlDatabase>),
    CachePool(Arc<dyn CachePool>),
    Broker(Arc<dyn Broker>),
    Middleware(Arc<dyn Middleware>),
}

impl std::fmt::Debug for DependencyOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DependencyOption({:?})", self.kind())
    }
}

impl DependencyOption {
    pub fn kind(&self) -> DependencyKind {
        match self {
            Self::SqlDatabase(_) => DependencyKind::SqlDatabase,
            Self::CachePool(_) => DependencyKind::CachePool,
            Self::Broker(_) => DependencyKind::Broker,
            Self::Middleware(_) => DependencyKind::Middleware,
        }
    }
}

/// Builder for the immutable [`Dependency`] container.
///
/// Supplying the same slot twice is rejected when the option is applied, and
/// `build` fails naming the first slot that was never supplied: an absent
/// dependency must surface at construction time, not as a stale accessor
/// result inside a module.
#[derive(Default)]
pub struct DependencyBuilder {
    sql_database: Option<Arc<dyn SqlDatabase>>,
    cache_pool: Option<Arc<dyn CachePool>>,
    broker: Option<Arc<dyn Broker>>,
    middleware: Option<Arc<dyn Middleware>>,
}

impl DependencyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, option: DependencyOption) -> Result<(), BootstrapError> {
        let kind = option.kind();
        match option {
            DependencyOption::SqlDatabase(v) => Self::fill(&mut self.sql_database, v, kind),
            DependencyOption::CachePool(v) => Self::fill(&mut self.cache_pool, v, kind),
            DependencyOption::Broker(v) => Self::fill(&mut self.broker, v, kind),
            DependencyOption::Middleware(v) => Self::fill(&mut self.middleware, v, kind),
        }
    }

    fn fill<T: ?Sized>(
        slot: &mut Option<Arc<T>>,
        value: Arc<T>,
        kind: DependencyKind,
    ) -> Result<(), BootstrapError> {
        if slot.is_some() {
            return Err(BootstrapError::DuplicateDependency(kind));
        }
        *slot = Some(value);
        Ok(())
    }

    pub fn build(self) -> Result<Dependency, BootstrapError> {
        Ok(Dependency {
            sql_database: self
                .sql_database
                .ok_or(BootstrapError::MissingDependency(DependencyKind::SqlDatabase))?,
            cache_pool: self
                .cache_pool
                .ok_or(BootstrapError::MissingDependency(DependencyKind::CachePool))?,
            broker: self
                .broker
                .ok_or(BootstrapError::MissingDependency(DependencyKind::Broker))?,
            middleware: self
                .middleware
                .ok_or(BootstrapError::MissingDependency(DependencyKind::Middleware))?,
        })
    }
}
