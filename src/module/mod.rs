use std::sync::Arc;

use crate::dependency::Dependency;

/// Independently pluggable feature unit.
///
/// Modules are constructed exactly once, in declared order, each from the
/// finished dependency container. They are mutually independent: a module may
/// depend on the shared container, never on another module's internal state.
pub trait Module: Send + Sync {
    /// Stable name used in logs and by the transport layer's routing tables.
    fn name(&self) -> &'static str;
}

/// Deferred module constructor; runs exactly once against the finished container.
pub type ModuleCtor = Box<dyn FnOnce(&Arc<Dependency>) -> Box<dyn Module> + Send>;
