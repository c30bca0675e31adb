use std::sync::Arc;
use std::time::Duration;

use strum_macros::{Display, EnumString};
use tracing::{info, warn};

use crate::dependency::{Dependency, DependencyOption};
use crate::error::BootstrapError;
use crate::lifecycle::{BootContext, CloserRegistry, InitStep, Loader, ShutdownReport};
use crate::module::{Module, ModuleCtor};

const FAILED_BOOT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Closed enumeration of deployable services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ServiceName {
    UserService,
    AuthService,
    NotificationService,
}

/// Composition root: one per process.
///
/// Holds the shared dependency container, the ordered module list and the
/// closer registry; the transport layer consumes it through the read-only
/// accessors.
pub struct Service {
    name: ServiceName,
    dependency: Arc<Dependency>,
    modules: Vec<Box<dyn Module>>,
    closers: CloserRegistry,
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Service {
    pub fn builder(name: ServiceName) -> ServiceBuilder {
        ServiceBuilder::new(name)
    }

    pub fn name(&self) -> ServiceName {
        self.name
    }

    pub fn dependency(&self) -> &Arc<Dependency> {
        &self.dependency
    }

    pub fn modules(&self) -> &[Box<dyn Module>] {
        &self.modules
    }

    /// Drains the closer registry. Every registered resource's close is
    /// attempted regardless of earlier failures.
    pub async fn shutdown(mut self, close_timeout: Duration) -> ShutdownReport {
        self.closers.close_all(close_timeout).await
    }
}

/// Collects init steps, cross-cutting options and module constructors, then
/// assembles the service in one fail-fast pass.
pub struct ServiceBuilder {
    name: ServiceName,
    loader: Loader,
    options: Vec<DependencyOption>,
    modules: Vec<ModuleCtor>,
}

impl ServiceBuilder {
    fn new(name: ServiceName) -> Self {
        Self {
            name,
            loader: Loader::new(),
            options: Vec::new(),
            modules: Vec::new(),
        }
    }

    /// Register a cross-cutting component that needs no initializer step.
    pub fn option(mut self, option: DependencyOption) -> Self {
        self.options.push(option);
        self
    }

    /// Register a resource initializer; execution order is registration order.
    pub fn step(mut self, step: InitStep) -> Self {
        self.loader = self.loader.step(step);
        self
    }

    /// Register a feature module constructor; construction order is
    /// registration order.
    pub fn module<F, M>(mut self, ctor: F) -> Self
    where
        F: FnOnce(&Arc<Dependency>) -> M + Send + 'static,
        M: Module + 'static,
    {
        self.modules
            .push(Box::new(move |deps| Box::new(ctor(deps))));
        self
    }

    /// Runs the loader, builds the container, constructs modules.
    ///
    /// Resources acquired before a later bootstrap failure are closed
    /// best-effort before the error propagates; startup failure remains fatal
    /// either way.
    pub async fn build(self, ctx: &BootContext) -> Result<Service, BootstrapError> {
        let mut closers = CloserRegistry::new();
        let step_options = match self.loader.run(ctx, &mut closers).await {
            Ok(options) => options,
            Err(err) => return Self::abort(closers, err).await,
        };

        let mut builder = Dependency::builder();
        for option in self.options.into_iter().chain(step_options) {
            if let Err(err) = builder.apply(option) {
                return Self::abort(closers, err).await;
            }
        }
        let dependency = match builder.build() {
            Ok(dependency) => Arc::new(dependency),
            Err(err) => return Self::abort(closers, err).await,
        };

        let mut modules = Vec::with_capacity(self.modules.len());
        for ctor in self.modules {
            let module = ctor(&dependency);
            info!(service = %self.name, module = module.name(), "module constructed");
            modules.push(module);
        }
        info!(service = %self.name, modules = modules.len(), "service assembled");

        Ok(Service {
            name: self.name,
            dependency,
            modules,
            closers,
        })
    }

    async fn abort(
        mut closers: CloserRegistry,
        err: BootstrapError,
    ) -> Result<Service, BootstrapError> {
        let report = closers.close_all(FAILED_BOOT_CLOSE_TIMEOUT).await;
        if !report.is_clean() {
            warn!(%report, "cleanup after failed bootstrap left failures");
        }
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigService;
    use crate::dependency::DependencyKind;
    use crate::lifecycle::StepOutput;
    use crate::middleware::{AuthError, Middleware, TokenClaims};
    use crate::resource::{
        Broker, BrokerError, CacheError, CachePool, Closer, SqlDatabasePair, SqlSettings, sql,
    };
    use async_trait::async_trait;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct StubCache {
        closed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Closer for StubCache {
        fn kind(&self) -> DependencyKind {
            DependencyKind::CachePool
        }
        async fn close(&self) -> anyhow::Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl CachePool for StubCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Ok(None)
        }
        async fn set_ex(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<(), CacheError> {
            Ok(())
        }
        async fn del(&self, _key: &str) -> Result<(), CacheError> {
            Ok(())
        }
    }

    struct StubBroker;

    #[async_trait]
    impl Closer for StubBroker {
        fn kind(&self) -> DependencyKind {
            DependencyKind::Broker
        }
        async fn close(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl Broker for StubBroker {
        async fn publish(
            &self,
            _topic: &str,
            _key: Option<&str>,
            _payload: &[u8],
        ) -> Result<(), BrokerError> {
            Ok(())
        }
    }

    struct AllowAll;

    #[async_trait]
    impl Middleware for AllowAll {
        async fn verify_bearer(&self, _header: &str) -> Result<TokenClaims, AuthError> {
            Err(AuthError::Unauthorized("stub".to_string()))
        }
    }

    struct MemberModule;
    struct CustomerModule;

    impl Module for MemberModule {
        fn name(&self) -> &'static str {
            "member"
        }
    }

    impl Module for CustomerModule {
        fn name(&self) -> &'static str {
            "customer"
        }
    }

    fn sql_config() -> ConfigService {
        ConfigService::from_pairs([
            (sql::SQL_DATABASE_NAME, "svc"),
            (sql::SQL_DRIVER_NAME, "postgres"),
            (sql::SQL_DB_READ_HOST, "r1"),
            (sql::SQL_DB_READ_USER, "u"),
            (sql::SQL_DB_READ_PASSWORD, "p"),
            (sql::SQL_DB_WRITE_HOST, "w1"),
            (sql::SQL_DB_WRITE_USER, "u"),
            (sql::SQL_DB_WRITE_PASSWORD, "p"),
        ])
    }

    fn lazy_sql_step() -> InitStep {
        InitStep::new(DependencyKind::SqlDatabase, |ctx| async move {
            let settings = SqlSettings::from_config(ctx.config())?;
            let pair = Arc::new(SqlDatabasePair::new(
                PgPoolOptions::new().connect_lazy_with(settings.read_options()),
                PgPoolOptions::new().connect_lazy_with(settings.write_options()),
            ));
            Ok(StepOutput {
                handle: pair.clone(),
                option: DependencyOption::SqlDatabase(pair),
            })
        })
    }

    fn cache_step(closed: Arc<AtomicBool>) -> InitStep {
        InitStep::new(DependencyKind::CachePool, move |_ctx| async move {
            let pool = Arc::new(StubCache { closed });
            Ok(StepOutput {
                handle: pool.clone(),
                option: DependencyOption::CachePool(pool),
            })
        })
    }

    fn broker_step() -> InitStep {
        InitStep::new(DependencyKind::Broker, |_ctx| async move {
            let broker = Arc::new(StubBroker);
            Ok(StepOutput {
                handle: broker.clone(),
                option: DependencyOption::Broker(broker),
            })
        })
    }

    #[tokio::test]
    async fn assembles_modules_in_declared_order() {
        let ctx = BootContext::new(sql_config());
        let service = Service::builder(ServiceName::UserService)
            .option(DependencyOption::Middleware(Arc::new(AllowAll)))
            .step(lazy_sql_step())
            .step(cache_step(Arc::new(AtomicBool::new(false))))
            .step(broker_step())
            .module(|_deps| MemberModule)
            .module(|_deps| CustomerModule)
            .build(&ctx)
            .await
            .unwrap();

        assert_eq!(service.name(), ServiceName::UserService);
        let names: Vec<_> = service.modules().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["member", "customer"]);

        let report = service.shutdown(Duration::from_secs(1)).await;
        assert!(report.is_clean());
        assert_eq!(report.attempted(), 3);
    }

    #[tokio::test]
    async fn missing_container_slot_fails_and_releases_acquired_handles() {
        let closed = Arc::new(AtomicBool::new(false));
        let ctx = BootContext::new(sql_config());
        // No broker step and no middleware option: container build must fail.
        let err = Service::builder(ServiceName::UserService)
            .option(DependencyOption::Middleware(Arc::new(AllowAll)))
            .step(lazy_sql_step())
            .step(cache_step(Arc::clone(&closed)))
            .build(&ctx)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BootstrapError::MissingDependency(DependencyKind::Broker)
        ));
        // The cache handle acquired before the failure was still closed.
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn duplicate_option_is_a_bootstrap_error() {
        let ctx = BootContext::new(sql_config());
        let err = Service::builder(ServiceName::UserService)
            .option(DependencyOption::Middleware(Arc::new(AllowAll)))
            .option(DependencyOption::Middleware(Arc::new(AllowAll)))
            .step(lazy_sql_step())
            .step(cache_step(Arc::new(AtomicBool::new(false))))
            .step(broker_step())
            .build(&ctx)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BootstrapError::DuplicateDependency(DependencyKind::Middleware)
        ));
    }

    #[test]
    fn service_names_render_kebab_case() {
        assert_eq!(ServiceName::UserService.to_string(), "user-service");
        assert_eq!(
            "notification-service".parse::<ServiceName>().unwrap(),
            ServiceName::NotificationService
        );
    }
}
