//! # Groundwork
//!
//! Startup resource bootstrap and dependency injection runtime for modular
//! backend services.
//!
//! Groundwork owns the stretch of a service's life between "process started"
//! and "transport layer takes over": it connects external resources in a
//! deterministic order, tracks their shutdown handles, freezes everything into
//! an immutable dependency container, and constructs the feature modules that
//! consume it.
//!
//! ## Features
//!
//! - **Fail-fast bootstrap**: resource initializers run strictly in order; the
//!   first failure aborts startup with an error naming the resource and cause
//! - **Aggregate graceful shutdown**: every registered handle is closed in
//!   reverse order, failures are collected instead of short-circuiting
//! - **Immutable dependency container**: one slot per resource kind, validated
//!   at build time, referentially stable accessors
//! - **Read/write split SQL pair**: independent read and write pools from
//!   environment-sourced settings
//! - **Pluggable modules**: feature units built exactly once from the finished
//!   container, unaware of each other
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use groundwork::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = BootContext::new(ConfigService::from_env());
//!
//!     let service = Service::builder(ServiceName::UserService)
//!         .option(DependencyOption::Middleware(Arc::new(
//!             ServiceAuthMiddleware::new(auth_sdk_client()),
//!         )))
//!         .step(SqlDatabasePair::init_step())
//!         .step(RedisCachePool::init_step())
//!         .step(KafkaBroker::init_step())
//!         .module(MemberModule::new)
//!         .module(CustomerModule::new)
//!         .module(AuthModule::new)
//!         .build(&ctx)
//!         .await?;
//!
//!     // Hand `service` to the transport layer, then wait for shutdown.
//!     let report = ShutdownHandler::new(service).wait_for_shutdown().await;
//!     std::process::exit(if report.is_clean() { 0 } else { 1 });
//! }
//! ```

pub mod config;
pub mod dependency;
pub mod error;
pub mod lifecycle;
pub mod middleware;
pub mod module;
pub mod resource;
pub mod service;

// Re-export core types
pub use config::ConfigService;
pub use dependency::{Dependency, DependencyBuilder, DependencyKind, DependencyOption};
pub use error::{BootstrapError, Result};
pub use lifecycle::{
    BootContext, CloserRegistry, InitStep, Loader, ShutdownHandler, ShutdownReport, StepOutput,
    shutdown_signal,
};
pub use middleware::{Middleware, ServiceAuthMiddleware, TokenValidator};
pub use module::Module;
pub use resource::{
    Broker, CachePool, Closer, Endpoint, KafkaBroker, RedisCachePool, SqlDatabase, SqlDatabasePair,
};
pub use service::{Service, ServiceBuilder, ServiceName};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;

/// Prelude module for convenient imports
///
/// ```
/// use groundwork::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::ConfigService;
    pub use crate::dependency::{Dependency, DependencyBuilder, DependencyKind, DependencyOption};
    pub use crate::error::{BootstrapError, Result};
    pub use crate::lifecycle::{
        BootContext, CloserRegistry, InitStep, Loader, ShutdownFailure, ShutdownHandler,
        ShutdownReport, StepOutput, shutdown_signal,
    };
    pub use crate::middleware::{
        AuthError, Middleware, ServiceAuthMiddleware, TokenClaims, TokenValidator,
    };
    pub use crate::module::Module;
    pub use crate::resource::{
        Broker, BrokerError, BrokerSettings, CacheError, CachePool, CacheSettings, Closer,
        Endpoint, KafkaBroker, RedisCachePool, SqlDatabase, SqlDatabasePair, SqlSettings,
        publish_json,
    };
    pub use crate::service::{Service, ServiceBuilder, ServiceName};
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
