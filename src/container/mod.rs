//! Per-request container instances.
//!
//! A [`ContainerInstance`] is the isolated resolution namespace of one scope.
//! Unbound tokens fall through to the [`DefaultContainer`] shared by every
//! scope of a registry.

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{DiError, DiResult};
use crate::id::ScopeId;
use crate::internal::{with_circular_guard, AsyncDisposer, DisposeBag, SyncDisposer};
use crate::lifetime::Lifetime;
use crate::registration::{filled_slot, AnyArc, Provider, Registration, Slot};
use crate::token::Token;
use crate::traits::{Resolver, ResolverCore};

pub mod context;
pub mod defaults;

pub use context::ResolverContext;
pub use defaults::DefaultContainer;

/// Lifecycle state of a [`ContainerInstance`].
///
/// The only transition is `Active -> Disposed`; it is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Active,
    Disposed,
}

/// Isolated dependency-resolution namespace for one request scope.
///
/// Instances are created by [`ScopeRegistry::create_scope`](crate::ScopeRegistry::create_scope)
/// and owned by the registry entry. Handles handed out to request code become
/// unusable once the scope is disposed: `register` and `resolve` then fail
/// with [`DiError::ContainerDisposed`].
///
/// # Reuse policies
///
/// - **Scoped**: memoized in this instance until it is disposed
/// - **Transient**: the factory runs on every resolution
/// - **Singleton**: the binding is forwarded to the default container
///
/// # Examples
///
/// ```
/// use scoped_container::{DiError, Provider, Resolver, ScopeRegistry};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// struct Session(usize);
///
/// let created = Arc::new(AtomicUsize::new(0));
/// let counter = created.clone();
///
/// let registry = ScopeRegistry::new();
/// let scope = registry.create_scope("r1".into()).unwrap();
/// scope.register_scoped(Provider::factory(move |_| {
///     Session(counter.fetch_add(1, Ordering::SeqCst))
/// })).unwrap();
///
/// let a = scope.get::<Session>().unwrap();
/// let b = scope.get::<Session>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// assert_eq!(created.load(Ordering::SeqCst), 1);
///
/// registry.dispose_scope(&"r1".into());
/// assert!(matches!(scope.get::<Session>(), Err(DiError::ContainerDisposed(_))));
/// ```
pub struct ContainerInstance {
    id: ScopeId,
    defaults: Arc<DefaultContainer>,
    state: Mutex<ScopeState>,
}

struct ScopeState {
    status: ContainerState,
    bindings: HashMap<Token, Registration>,
    instances: HashMap<Token, Slot>,
    disposers: DisposeBag,
}

/// Everything a disposed scope owned, taken out so it can be released without the lock.
struct Retired {
    bindings: HashMap<Token, Registration>,
    instances: HashMap<Token, Slot>,
    disposers: DisposeBag,
}

impl ContainerInstance {
    pub(crate) fn new(id: ScopeId, defaults: Arc<DefaultContainer>) -> Self {
        Self {
            id,
            defaults,
            state: Mutex::new(ScopeState {
                status: ContainerState::Active,
                bindings: HashMap::new(),
                instances: HashMap::new(),
                disposers: DisposeBag::default(),
            }),
        }
    }

    /// Identifier of the scope this container belongs to.
    pub fn id(&self) -> &ScopeId {
        &self.id
    }

    pub fn state(&self) -> ContainerState {
        self.state.lock().status
    }

    pub fn is_disposed(&self) -> bool {
        self.state() == ContainerState::Disposed
    }

    /// The default container unbound tokens fall through to.
    pub fn defaults(&self) -> &Arc<DefaultContainer> {
        &self.defaults
    }

    /// Binds `token` to `provider` with the given reuse policy.
    ///
    /// Re-registering a token replaces the previous binding and evicts its
    /// memoized instance (last write wins), which lets a request override a
    /// default binding. Singleton bindings are stored in the default container
    /// and replace any local binding for the same token.
    pub fn register<T>(
        &self,
        token: impl Into<Token>,
        provider: Provider<T>,
        lifetime: Lifetime,
    ) -> DiResult<()>
    where
        T: Send + Sync + 'static,
    {
        let token = token.into();
        let registration = provider.into_registration(lifetime);

        let mut state = self.state.lock();
        if state.status == ContainerState::Disposed {
            return Err(DiError::ContainerDisposed(self.id.clone()));
        }

        tracing::trace!(scope = %self.id, token = %token, ?lifetime, "registering binding");

        state.instances.remove(&token);
        if lifetime == Lifetime::Singleton {
            state.bindings.remove(&token);
            drop(state);
            self.defaults.insert_registration(token, registration);
            return Ok(());
        }

        if lifetime == Lifetime::Scoped {
            if let Some(value) = registration.value().cloned() {
                if let Some(hook) = registration.teardown_for(value.clone()) {
                    state.disposers.push_sync(hook);
                }
                state.instances.insert(token.clone(), filled_slot(value));
            }
        }
        state.bindings.insert(token, registration);
        Ok(())
    }

    /// Registers a scoped binding under the type token of `T`.
    pub fn register_scoped<T>(&self, provider: Provider<T>) -> DiResult<()>
    where
        T: Send + Sync + 'static,
    {
        self.register(Token::of::<T>(), provider, Lifetime::Scoped)
    }

    /// Registers a transient binding under the type token of `T`.
    pub fn register_transient<T>(&self, provider: Provider<T>) -> DiResult<()>
    where
        T: Send + Sync + 'static,
    {
        self.register(Token::of::<T>(), provider, Lifetime::Transient)
    }

    /// Registers a singleton binding under the type token of `T`.
    pub fn register_singleton<T>(&self, provider: Provider<T>) -> DiResult<()>
    where
        T: Send + Sync + 'static,
    {
        self.register(Token::of::<T>(), provider, Lifetime::Singleton)
    }

    /// Binds `token` to a scoped value.
    pub fn set<T: Send + Sync + 'static>(&self, token: impl Into<Token>, value: T) -> DiResult<()> {
        self.register(token, Provider::value(value), Lifetime::Scoped)
    }

    /// True if `token` is bound here or in the default container.
    pub fn contains(&self, token: impl Into<Token>) -> bool {
        let token = token.into();
        let bound_here = {
            let state = self.state.lock();
            state.status == ContainerState::Active && state.bindings.contains_key(&token)
        };
        bound_here || self.defaults.contains(token)
    }

    /// Runs teardowns (LIFO) and clears every binding. Idempotent.
    ///
    /// Async teardowns cannot run here; they are dropped with a warning. Use
    /// [`dispose_async`](Self::dispose_async) when async teardowns are registered.
    pub fn dispose(&self) {
        let Some(mut retired) = self.retire() else {
            return;
        };
        let dropped = retired.disposers.discard_async();
        if dropped > 0 {
            tracing::warn!(
                scope = %self.id,
                dropped,
                "async teardowns skipped by synchronous dispose"
            );
        }
        retired.disposers.run_all_sync_reverse();
        tracing::debug!(
            scope = %self.id,
            bindings = retired.bindings.len(),
            instances = retired.instances.len(),
            "disposed container"
        );
    }

    /// Runs async teardowns, then sync teardowns (both LIFO), and clears every binding. Idempotent.
    pub async fn dispose_async(&self) {
        let Some(mut retired) = self.retire() else {
            return;
        };
        retired.disposers.run_all_async_reverse().await;
        retired.disposers.run_all_sync_reverse();
        tracing::debug!(
            scope = %self.id,
            bindings = retired.bindings.len(),
            instances = retired.instances.len(),
            "disposed container"
        );
    }

    fn retire(&self) -> Option<Retired> {
        let mut state = self.state.lock();
        if state.status == ContainerState::Disposed {
            return None;
        }
        state.status = ContainerState::Disposed;
        Some(Retired {
            bindings: mem::take(&mut state.bindings),
            instances: mem::take(&mut state.instances),
            disposers: mem::take(&mut state.disposers),
        })
    }

    fn resolve_any_impl(&self, token: &Token) -> DiResult<AnyArc> {
        let (registration, slot) = {
            let mut state = self.state.lock();
            if state.status == ContainerState::Disposed {
                return Err(DiError::ContainerDisposed(self.id.clone()));
            }
            if let Some(value) = state.instances.get(token).and_then(|slot| slot.get()) {
                return Ok(value.clone());
            }
            let registration = state.bindings.get(token).cloned();
            let slot = match &registration {
                Some(r) if r.lifetime != Lifetime::Transient => {
                    Some(state.instances.entry(token.clone()).or_default().clone())
                }
                _ => None,
            };
            (registration, slot)
        };

        let Some(registration) = registration else {
            return self.defaults.resolve_unguarded(token);
        };

        // The factory runs without the lock so it can resolve from this scope
        let ctx = ResolverContext::new(self);
        let Some(slot) = slot else {
            return registration.produce(&ctx);
        };

        // Racing first resolutions block on the slot; the factory runs once
        slot.get_or_try_init(|| {
            let value = registration.produce(&ctx)?;
            self.adopt(&registration, &value)?;
            Ok(value)
        })
        .cloned()
    }

    /// Takes ownership of a freshly built instance's teardown.
    ///
    /// The instance belongs to this scope even if its binding was replaced
    /// while the factory ran. If the scope was disposed meanwhile, the
    /// teardown runs at once and the resolution fails.
    fn adopt(&self, registration: &Registration, value: &AnyArc) -> DiResult<()> {
        let hook = registration.teardown_for(value.clone());
        let mut state = self.state.lock();
        if state.status == ContainerState::Disposed {
            drop(state);
            if let Some(hook) = hook {
                hook();
            }
            return Err(DiError::ContainerDisposed(self.id.clone()));
        }
        if let Some(hook) = hook {
            state.disposers.push_sync(hook);
        }
        Ok(())
    }
}

impl ResolverCore for ContainerInstance {
    fn resolve_any(&self, token: &Token) -> DiResult<AnyArc> {
        with_circular_guard(token, || self.resolve_any_impl(token))
    }

    fn push_sync_disposer(&self, f: SyncDisposer) {
        let mut state = self.state.lock();
        if state.status == ContainerState::Active {
            state.disposers.push_sync(f);
            return;
        }
        drop(state);
        tracing::warn!(
            scope = %self.id,
            "teardown registered on a disposed container; running it now"
        );
        f();
    }

    fn push_async_disposer(&self, f: AsyncDisposer) {
        let mut state = self.state.lock();
        if state.status == ContainerState::Active {
            state.disposers.push_async(f);
            return;
        }
        drop(state);
        tracing::warn!(
            scope = %self.id,
            "async teardown registered on a disposed container; dropping it"
        );
    }
}

impl Resolver for ContainerInstance {}

impl std::fmt::Debug for ContainerInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerInstance")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
