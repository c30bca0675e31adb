mod builder;
mod container;

pub use builder::{DependencyBuilder, DependencyOption};
pub use container::Dependency;

use strum_macros::Display;

/// The closed set of slots a dependency container carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum DependencyKind {
    SqlDatabase,
    CachePool,
    Broker,
    Middleware,
}
