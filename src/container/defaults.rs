//! The default namespace shared by every scope of a registry.

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};

use crate::error::{DiError, DiResult};
use crate::internal::{with_circular_guard, AsyncDisposer, DisposeBag, SyncDisposer};
use crate::lifetime::Lifetime;
use crate::registration::{filled_slot, AnyArc, Provider, Registration, Slot};
use crate::token::Token;
use crate::traits::{Resolver, ResolverCore};

use super::ResolverContext;

static GLOBAL: Lazy<Arc<DefaultContainer>> = Lazy::new(|| Arc::new(DefaultContainer::new()));

/// Process-wide default container.
///
/// Holds the bindings every scope falls back to, along with singleton
/// instances. Scoped and singleton bindings here are both memoized for the
/// lifetime of the container; transient bindings re-run their factory.
///
/// Factories of default bindings resolve from the default container only, so
/// a singleton can never capture a request-scoped value.
///
/// # Examples
///
/// ```
/// use scoped_container::{DefaultContainer, Provider, Resolver, ScopeRegistry};
/// use std::sync::Arc;
///
/// struct RecipeStore { recipes: Vec<&'static str> }
///
/// let defaults = Arc::new(DefaultContainer::new());
/// defaults.register_singleton(Provider::value(RecipeStore { recipes: vec!["Pancakes"] }));
///
/// let registry = ScopeRegistry::with_defaults(defaults.clone());
/// let scope = registry.create_scope("r1".into()).unwrap();
/// assert_eq!(scope.get::<RecipeStore>().unwrap().recipes, vec!["Pancakes"]);
/// ```
pub struct DefaultContainer {
    state: RwLock<DefaultState>,
    // Teardown hooks are Send but not Sync, so they live outside the RwLock
    disposers: Mutex<DisposeBag>,
}

#[derive(Default)]
struct DefaultState {
    bindings: HashMap<Token, Registration>,
    instances: HashMap<Token, Slot>,
}

impl DefaultContainer {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(DefaultState::default()),
            disposers: Mutex::new(DisposeBag::default()),
        }
    }

    /// The process-wide instance.
    ///
    /// Registries built with [`ScopeRegistry::global_defaults`] share it.
    /// Prefer an owned container where isolation matters (tests).
    ///
    /// [`ScopeRegistry::global_defaults`]: crate::ScopeRegistry::global_defaults
    pub fn global() -> Arc<Self> {
        GLOBAL.clone()
    }

    /// Binds `token` to `provider`, replacing any previous binding.
    pub fn register<T>(&self, token: impl Into<Token>, provider: Provider<T>, lifetime: Lifetime)
    where
        T: Send + Sync + 'static,
    {
        self.insert_registration(token.into(), provider.into_registration(lifetime));
    }

    /// Registers a singleton binding under the type token of `T`.
    pub fn register_singleton<T: Send + Sync + 'static>(&self, provider: Provider<T>) {
        self.register(Token::of::<T>(), provider, Lifetime::Singleton);
    }

    /// Binds `token` to a singleton value.
    pub fn set<T: Send + Sync + 'static>(&self, token: impl Into<Token>, value: T) {
        self.register(token, Provider::value(value), Lifetime::Singleton);
    }

    pub fn contains(&self, token: impl Into<Token>) -> bool {
        self.state.read().bindings.contains_key(&token.into())
    }

    pub(crate) fn insert_registration(&self, token: Token, registration: Registration) {
        let mut state = self.state.write();
        state.instances.remove(&token);
        if registration.lifetime.is_cached() {
            if let Some(value) = registration.value().cloned() {
                if let Some(hook) = registration.teardown_for(value.clone()) {
                    self.disposers.lock().push_sync(hook);
                }
                state.instances.insert(token.clone(), filled_slot(value));
            }
        }
        tracing::trace!(
            token = %token,
            lifetime = ?registration.lifetime,
            "registering default binding"
        );
        state.bindings.insert(token, registration);
    }

    /// Resolution without a circular-guard frame, for scopes falling through
    /// with the token already on the resolution stack.
    pub(crate) fn resolve_unguarded(&self, token: &Token) -> DiResult<AnyArc> {
        let registration = {
            let state = self.state.read();
            if let Some(value) = state.instances.get(token).and_then(|slot| slot.get()) {
                return Ok(value.clone());
            }
            state.bindings.get(token).cloned()
        };
        let Some(registration) = registration else {
            return Err(DiError::UnresolvedToken(token.clone()));
        };

        let ctx = ResolverContext::new(self);
        if !registration.lifetime.is_cached() {
            return registration.produce(&ctx);
        }

        let slot = {
            let mut state = self.state.write();
            let still_bound = state
                .bindings
                .get(token)
                .is_some_and(|current| current.same_provider(&registration));
            if !still_bound {
                drop(state);
                return self.resolve_unguarded(token);
            }
            state.instances.entry(token.clone()).or_default().clone()
        };

        slot.get_or_try_init(|| {
            let value = registration.produce(&ctx)?;
            if let Some(hook) = registration.teardown_for(value.clone()) {
                self.disposers.lock().push_sync(hook);
            }
            Ok(value)
        })
        .cloned()
    }

    /// Runs every singleton teardown (async first, then sync, both LIFO) and
    /// drops memoized instances. Bindings stay registered, so later
    /// resolutions build fresh instances.
    pub async fn dispose_all(&self) {
        let instances = mem::take(&mut self.state.write().instances);
        let mut disposers = mem::take(&mut *self.disposers.lock());
        disposers.run_all_async_reverse().await;
        disposers.run_all_sync_reverse();
        tracing::debug!(instances = instances.len(), "disposed default container instances");
    }
}

impl Default for DefaultContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DefaultContainer {
    fn drop(&mut self) {
        if !self.disposers.get_mut().is_empty() {
            tracing::warn!(
                "DefaultContainer dropped with undisposed singletons; \
                 call dispose_all().await before dropping"
            );
        }
    }
}

impl ResolverCore for DefaultContainer {
    fn resolve_any(&self, token: &Token) -> DiResult<AnyArc> {
        with_circular_guard(token, || self.resolve_unguarded(token))
    }

    fn push_sync_disposer(&self, f: SyncDisposer) {
        self.disposers.lock().push_sync(f);
    }

    fn push_async_disposer(&self, f: AsyncDisposer) {
        self.disposers.lock().push_async(f);
    }
}

impl Resolver for DefaultContainer {}

impl std::fmt::Debug for DefaultContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("DefaultContainer")
            .field("bindings", &state.bindings.len())
            .field("instances", &state.instances.len())
            .finish()
    }
}
