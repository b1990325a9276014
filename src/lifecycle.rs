//! Request lifecycle hooks: open a scope per request, close it per response.
//!
//! The transport layer owns the request loop. It calls
//! [`ContextFactory::create_context`] before any resolver runs and
//! [`ResponseFinalizer::finalize`] once every resolver has settled, just
//! before the response is sent. A request whose finalizer never runs leaks
//! its scope; [`ScopeGuard`] and [`RequestScopeHooks::run`] close that gap for
//! cancelled or panicking requests.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DiResult;
use crate::id::{IdGenerator, ScopeId, UuidGenerator};
use crate::registry::ScopeRegistry;
use crate::request::{RequestContext, CONTEXT_TOKEN};

type Seeder = Arc<dyn Fn(&RequestContext) -> DiResult<()> + Send + Sync>;

/// Invoked once per request before resolver execution.
#[async_trait]
pub trait ContextFactory: Send + Sync {
    async fn create_context(&self) -> DiResult<RequestContext>;
}

/// Invoked once per request after resolver execution, before the response is sent.
///
/// Implementations dispose the request's scope and hand the response back
/// unchanged.
#[async_trait]
pub trait ResponseFinalizer<R: Send + 'static>: Send + Sync {
    async fn finalize(&self, response: R, context: &RequestContext) -> R;
}

/// The standard hook pair over a [`ScopeRegistry`].
///
/// # Examples
///
/// ```
/// use scoped_container::{RequestScopeHooks, ScopeRegistry, SequentialGenerator};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let registry = Arc::new(ScopeRegistry::new());
/// let hooks = RequestScopeHooks::new(registry.clone())
///     .with_id_generator(SequentialGenerator::new("req"))
///     .with_seed(|ctx| ctx.container().set("user", "alice".to_string()));
///
/// let user = hooks
///     .run(|ctx| async move { ctx.resolve::<String>("user") })
///     .await
///     .unwrap();
///
/// assert_eq!(user.as_str(), "alice");
/// assert_eq!(registry.live_scope_count(), 0);
/// # }
/// ```
#[derive(Clone)]
pub struct RequestScopeHooks {
    registry: Arc<ScopeRegistry>,
    ids: Arc<dyn IdGenerator>,
    seeders: Vec<Seeder>,
}

impl RequestScopeHooks {
    /// Hooks generating random UUID scope ids.
    pub fn new(registry: Arc<ScopeRegistry>) -> Self {
        Self {
            registry,
            ids: Arc::new(UuidGenerator),
            seeders: Vec::new(),
        }
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// Adds a step that registers per-request bindings after the context.
    ///
    /// Seeders run in insertion order. If one fails the scope is disposed and
    /// the error is returned from `create_context`.
    pub fn with_seed<F>(mut self, seed: F) -> Self
    where
        F: Fn(&RequestContext) -> DiResult<()> + Send + Sync + 'static,
    {
        self.seeders.push(Arc::new(seed));
        self
    }

    pub fn registry(&self) -> &Arc<ScopeRegistry> {
        &self.registry
    }

    /// Opens the scope for a new request: id, container, context registration, seeders.
    pub fn open(&self) -> DiResult<RequestContext> {
        let id = self.ids.next_id();
        let container = self.registry.create_scope(id.clone())?;
        let context = RequestContext::new(id, container);

        if let Err(e) = self.seed(&context) {
            self.registry.dispose_scope(context.request_id());
            return Err(e);
        }
        Ok(context)
    }

    fn seed(&self, context: &RequestContext) -> DiResult<()> {
        context.container().set(CONTEXT_TOKEN, context.clone())?;
        for seeder in &self.seeders {
            seeder(context)?;
        }
        Ok(())
    }

    /// Closes the request's scope. Safe to call more than once.
    pub async fn close(&self, context: &RequestContext) {
        self.registry.dispose_scope_async(context.request_id()).await;
        if self.registry.config().log_live_scopes {
            let live = self.registry.list_live_scope_ids();
            tracing::info!(count = live.len(), live = ?live, "request scopes left in memory");
        }
    }

    /// Guard that disposes the context's scope if dropped before [`ScopeGuard::disarm`].
    pub fn guard(&self, context: &RequestContext) -> ScopeGuard {
        ScopeGuard::new(self.registry.clone(), context.request_id().clone())
    }

    /// Runs `body` inside a fresh request scope.
    ///
    /// The scope is closed after `body` settles, whether it returned `Ok` or
    /// `Err`. If the returned future is dropped early, or `body` panics, the
    /// guard disposes the scope synchronously.
    pub async fn run<T, F, Fut>(&self, body: F) -> DiResult<T>
    where
        F: FnOnce(RequestContext) -> Fut,
        Fut: Future<Output = DiResult<T>>,
    {
        let context = self.open()?;
        let guard = self.guard(&context);
        let result = body(context.clone()).await;
        self.close(&context).await;
        guard.disarm();
        result
    }
}

#[async_trait]
impl ContextFactory for RequestScopeHooks {
    async fn create_context(&self) -> DiResult<RequestContext> {
        self.open()
    }
}

#[async_trait]
impl<R: Send + 'static> ResponseFinalizer<R> for RequestScopeHooks {
    async fn finalize(&self, response: R, context: &RequestContext) -> R {
        self.close(context).await;
        response
    }
}

impl std::fmt::Debug for RequestScopeHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestScopeHooks")
            .field("registry", &self.registry)
            .field("seeders", &self.seeders.len())
            .finish_non_exhaustive()
    }
}

/// Disposes a scope when dropped, unless disarmed.
///
/// Covers requests that never reach their finalizer: an aborted connection
/// dropping the request future, or a panic in resolver code. Disposal from the
/// guard is synchronous, so async teardowns of that scope are skipped.
#[must_use = "dropping the guard immediately disposes the scope"]
pub struct ScopeGuard {
    registry: Arc<ScopeRegistry>,
    id: Option<ScopeId>,
}

impl ScopeGuard {
    pub fn new(registry: Arc<ScopeRegistry>, id: ScopeId) -> Self {
        Self {
            registry,
            id: Some(id),
        }
    }

    /// The guarded scope id, while armed.
    pub fn id(&self) -> Option<&ScopeId> {
        self.id.as_ref()
    }

    /// Releases the guard without touching the scope.
    pub fn disarm(mut self) {
        self.id = None;
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            if self.registry.dispose_scope(&id) {
                tracing::warn!(
                    scope = %id,
                    "request scope released by guard; the response finalizer did not run"
                );
            }
        }
    }
}

impl std::fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard").field("id", &self.id).finish()
    }
}
