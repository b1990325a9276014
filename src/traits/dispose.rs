//! Disposal traits for resource cleanup.

/// Trait for synchronous resource disposal.
///
/// Implement this trait for services that need structured teardown when their
/// scope ends (flushing a per-request buffer, releasing a pooled connection).
/// Attach it with [`Provider::disposable`](crate::Provider::disposable) or
/// register it from a factory through the resolver context.
///
/// # Examples
///
/// ```
/// use scoped_container::{Dispose, Provider, Resolver, ScopeRegistry};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// struct UnitOfWork {
///     committed: Arc<AtomicBool>,
/// }
///
/// impl Dispose for UnitOfWork {
///     fn dispose(&self) {
///         self.committed.store(true, Ordering::SeqCst);
///     }
/// }
///
/// let committed = Arc::new(AtomicBool::new(false));
/// let flag = committed.clone();
///
/// let registry = ScopeRegistry::new();
/// let scope = registry.create_scope("r1".into()).unwrap();
/// scope.register_scoped(
///     Provider::factory(move |_| UnitOfWork { committed: flag.clone() }).disposable(),
/// ).unwrap();
/// let _ = scope.get::<UnitOfWork>().unwrap();
///
/// registry.dispose_scope(&"r1".into());
/// assert!(committed.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}

/// Trait for asynchronous resource disposal.
///
/// Async teardowns run before sync teardowns, in LIFO order, when a scope is
/// disposed through [`ScopeRegistry::dispose_scope_async`] or the response
/// finalizer.
///
/// [`ScopeRegistry::dispose_scope_async`]: crate::ScopeRegistry::dispose_scope_async
///
/// # Examples
///
/// ```
/// use scoped_container::{AsyncDispose, Provider, Resolver, ScopeRegistry};
/// use async_trait::async_trait;
/// use std::sync::Arc;
///
/// struct Transaction {
///     id: String,
/// }
///
/// #[async_trait]
/// impl AsyncDispose for Transaction {
///     async fn dispose(&self) {
///         println!("rolling back {}", self.id);
///     }
/// }
///
/// let registry = ScopeRegistry::new();
/// let scope = registry.create_scope("r1".into()).unwrap();
/// scope.register_scoped(Provider::factory(|r| {
///     let tx = Arc::new(Transaction { id: "tx-1".to_string() });
///     r.register_async_disposer(tx.clone());
///     Transaction { id: "tx-1".to_string() }
/// })).unwrap();
/// ```
#[async_trait::async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    /// Perform asynchronous cleanup of resources.
    async fn dispose(&self);
}
