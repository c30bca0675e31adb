use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ConfigService;
use crate::dependency::{DependencyKind, DependencyOption};
use crate::error::BootstrapError;
use crate::resource::Closer;

use super::CloserRegistry;

/// Shared context every resource initializer step runs against.
#[derive(Clone)]
pub struct BootContext {
    config: ConfigService,
    cancel: CancellationToken,
}

impl BootContext {
    pub fn new(config: ConfigService) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(config: ConfigService, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    pub fn config(&self) -> &ConfigService {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// What a successful initializer step yields: the live handle for the closer
/// registry and the option destined for the container builder.
pub struct StepOutput {
    pub handle: Arc<dyn Closer>,
    pub option: DependencyOption,
}

type StepFuture = Pin<Box<dyn Future<Output = Result<StepOutput, BootstrapError>> + Send>>;
type StepFn = Box<dyn FnOnce(BootContext) -> StepFuture + Send>;

/// One resource-construction step, tagged with the kind it produces.
///
/// Steps return their dependency option explicitly instead of mutating shared
/// builder state.
pub struct InitStep {
    kind: DependencyKind,
    run: StepFn,
}

impl InitStep {
    pub fn new<F, Fut>(kind: DependencyKind, run: F) -> Self
    where
        F: FnOnce(BootContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<StepOutput, BootstrapError>> + Send + 'static,
    {
        Self {
            kind,
            run: Box::new(move |ctx| Box::pin(run(ctx))),
        }
    }

    pub fn kind(&self) -> DependencyKind {
        self.kind
    }
}

/// Runs resource-construction steps strictly in registration order.
///
/// Steps run one at a time on the bootstrapping task. The first failing step
/// aborts the whole sequence and later steps never run. Handles registered by
/// earlier successful steps stay in the caller's registry so they remain
/// closable.
#[derive(Default)]
pub struct Loader {
    steps: Vec<InitStep>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: InitStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub async fn run(
        self,
        ctx: &BootContext,
        registry: &mut CloserRegistry,
    ) -> Result<Vec<DependencyOption>, BootstrapError> {
        let mut options = Vec::with_capacity(self.steps.len());
        for step in self.steps {
            let kind = step.kind;
            if ctx.cancel.is_cancelled() {
                return Err(BootstrapError::Canceled(kind));
            }
            debug!(%kind, "initializing resource");
            let output = tokio::select! {
                _ = ctx.cancel.cancelled() => return Err(BootstrapError::Canceled(kind)),
                result = (step.run)(ctx.clone()) => result?,
            };
            registry.register(output.handle);
            options.push(output.option);
            info!(%kind, "resource initialized");
        }
        info!(count = registry.len(), "all resources initialized");
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{AuthError, Middleware, TokenClaims};
    use crate::resource::{CacheError, CachePool};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubCache;

    #[async_trait]
    impl Closer for StubCache {
        fn kind(&self) -> DependencyKind {
            DependencyKind::CachePool
        }
        async fn close(&self) -> anyhow::Result<()> {
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

    struct AllowAll;

    #[async_trait]
    impl Middleware for AllowAll {
        async fn verify_bearer(&self, _header: &str) -> Result<TokenClaims, AuthError> {
            Err(AuthError::Unauthorized("stub".to_string()))
        }
    }

    fn cache_step(counter: Arc<AtomicUsize>) -> InitStep {
        InitStep::new(DependencyKind::CachePool, move |_ctx| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let pool = Arc::new(StubCache);
            Ok(StepOutput {
                handle: pool.clone(),
                option: DependencyOption::CachePool(pool),
            })
        })
    }

    fn failing_step(kind: DependencyKind) -> InitStep {
        InitStep::new(kind, move |_ctx| async move {
            Err(BootstrapError::MissingConfig("KAFKA_BROKER_HOSTS"))
        })
    }

    #[tokio::test]
    async fn first_failure_stops_the_sequence() {
        let first = Arc::new(AtomicUsize::new(0));
        let third = Arc::new(AtomicUsize::new(0));
        let loader = Loader::new()
            .step(cache_step(Arc::clone(&first)))
            .step(failing_step(DependencyKind::Broker))
            .step(cache_step(Arc::clone(&third)));

        let ctx = BootContext::new(ConfigService::default());
        let mut registry = CloserRegistry::new();
        let err = loader.run(&ctx, &mut registry).await.unwrap_err();

        assert!(matches!(err, BootstrapError::MissingConfig(_)));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(third.load(Ordering::SeqCst), 0);
        // The handle acquired before the failure stays registered and closable.
        assert_eq!(registry.kinds(), vec![DependencyKind::CachePool]);
        let report = registry.close_all(std::time::Duration::from_secs(1)).await;
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn options_are_collected_in_step_order() {
        let middleware_step = InitStep::new(DependencyKind::Middleware, |_ctx| async move {
            let middleware: Arc<dyn Middleware> = Arc::new(AllowAll);
            let handle = Arc::new(StubCache);
            Ok(StepOutput {
                handle,
                option: DependencyOption::Middleware(middleware),
            })
        });
        let loader = Loader::new()
            .step(cache_step(Arc::new(AtomicUsize::new(0))))
            .step(middleware_step);

        let ctx = BootContext::new(ConfigService::default());
        let mut registry = CloserRegistry::new();
        let options = loader.run(&ctx, &mut registry).await.unwrap();

        let kinds: Vec<_> = options.iter().map(|o| o.kind()).collect();
        assert_eq!(kinds, vec![DependencyKind::CachePool, DependencyKind::Middleware]);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn cancellation_aborts_before_the_next_step() {
        let ran = Arc::new(AtomicUsize::new(0));
        let loader = Loader::new().step(cache_step(Arc::clone(&ran)));

        let cancel = CancellationToken::new();
        cancel.cancel();
        let ctx = BootContext::with_cancel(ConfigService::default(), cancel);
        let mut registry = CloserRegistry::new();
        let err = loader.run(&ctx, &mut registry).await.unwrap_err();

        assert!(matches!(
            err,
            BootstrapError::Canceled(DependencyKind::CachePool)
        ));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
    }
}
