//! The scope registry: live request scopes keyed by identifier.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::RegistryConfig;
use crate::container::{ContainerInstance, DefaultContainer};
use crate::error::{DiError, DiResult};
use crate::id::ScopeId;

/// Table of live request scopes.
///
/// A container is present in the registry if and only if its request is
/// still being processed. The registry is an ordinary owned value: share it
/// with `Arc` between the code that opens scopes and the code that closes
/// them, and build as many independent registries as needed (one per test,
/// for instance).
///
/// The map is sharded, so creating or disposing one scope never blocks
/// lookups of scopes on other shards. Teardowns run after the entry has been
/// removed, outside any registry lock.
///
/// # Examples
///
/// ```
/// use scoped_container::{DiError, ScopeRegistry};
///
/// let registry = ScopeRegistry::new();
/// registry.create_scope("r1".into()).unwrap();
/// registry.create_scope("r2".into()).unwrap();
/// assert!(matches!(registry.create_scope("r1".into()), Err(DiError::DuplicateScope(_))));
///
/// assert!(registry.dispose_scope(&"r1".into()));
/// assert!(!registry.dispose_scope(&"r1".into())); // idempotent
/// assert!(matches!(registry.get_scope(&"r1".into()), Err(DiError::ScopeNotFound(_))));
/// assert_eq!(registry.list_live_scope_ids(), vec!["r2".into()]);
/// # registry.dispose_all();
/// ```
pub struct ScopeRegistry {
    scopes: DashMap<ScopeId, Arc<ContainerInstance>>,
    defaults: Arc<DefaultContainer>,
    config: RegistryConfig,
}

impl ScopeRegistry {
    /// A registry with its own, empty default container.
    pub fn new() -> Self {
        Self::with_defaults(Arc::new(DefaultContainer::new()))
    }

    /// A registry whose scopes fall back to `defaults`.
    pub fn with_defaults(defaults: Arc<DefaultContainer>) -> Self {
        Self {
            scopes: DashMap::new(),
            defaults,
            config: RegistryConfig::default(),
        }
    }

    /// A registry whose scopes fall back to [`DefaultContainer::global`].
    pub fn global_defaults() -> Self {
        Self::with_defaults(DefaultContainer::global())
    }

    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn defaults(&self) -> &Arc<DefaultContainer> {
        &self.defaults
    }

    /// Registers a new, empty container under `id`.
    ///
    /// Fails with [`DiError::DuplicateScope`] if `id` is live already.
    pub fn create_scope(&self, id: ScopeId) -> DiResult<Arc<ContainerInstance>> {
        let container = match self.scopes.entry(id) {
            Entry::Occupied(entry) => return Err(DiError::DuplicateScope(entry.key().clone())),
            Entry::Vacant(entry) => {
                let container = Arc::new(ContainerInstance::new(
                    entry.key().clone(),
                    self.defaults.clone(),
                ));
                entry.insert(container.clone());
                container
            }
        };

        // The shard lock is released above; len() visits every shard
        let live = self.scopes.len();
        tracing::debug!(scope = %container.id(), live, "created request scope");
        if let Some(threshold) = self.config.leak_warning_threshold {
            if live > threshold {
                tracing::warn!(
                    live,
                    threshold,
                    "live request scopes exceed the leak warning threshold; \
                     is the response finalizer running?"
                );
            }
        }
        Ok(container)
    }

    /// The live container registered under `id`.
    pub fn get_scope(&self, id: &ScopeId) -> DiResult<Arc<ContainerInstance>> {
        self.scopes
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DiError::ScopeNotFound(id.clone()))
    }

    pub fn contains_scope(&self, id: &ScopeId) -> bool {
        self.scopes.contains_key(id)
    }

    /// Removes `id` and disposes its container.
    ///
    /// Returns `false` without error when `id` is not live, so a finalizer
    /// that runs twice is harmless.
    pub fn dispose_scope(&self, id: &ScopeId) -> bool {
        let Some((_, container)) = self.scopes.remove(id) else {
            return false;
        };
        container.dispose();
        tracing::debug!(scope = %id, "disposed request scope");
        true
    }

    /// Like [`dispose_scope`](Self::dispose_scope), running async teardowns first.
    pub async fn dispose_scope_async(&self, id: &ScopeId) -> bool {
        let Some((_, container)) = self.scopes.remove(id) else {
            return false;
        };
        container.dispose_async().await;
        tracing::debug!(scope = %id, "disposed request scope");
        true
    }

    /// Snapshot of the live scope ids, sorted.
    pub fn list_live_scope_ids(&self) -> Vec<ScopeId> {
        let mut ids: Vec<ScopeId> = self.scopes.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn live_scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Disposes every live scope, returning how many there were.
    pub fn dispose_all(&self) -> usize {
        self.list_live_scope_ids()
            .iter()
            .filter(|id| self.dispose_scope(id))
            .count()
    }

    /// Async variant of [`dispose_all`](Self::dispose_all).
    pub async fn dispose_all_async(&self) -> usize {
        let mut disposed = 0;
        for id in self.list_live_scope_ids() {
            if self.dispose_scope_async(&id).await {
                disposed += 1;
            }
        }
        disposed
    }
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScopeRegistry {
    fn drop(&mut self) {
        let leaked = self.scopes.len();
        if leaked > 0 {
            tracing::warn!(
                leaked,
                "ScopeRegistry dropped with live scopes; their teardowns will not run"
            );
        }
    }
}

impl std::fmt::Debug for ScopeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeRegistry")
            .field("live_scopes", &self.scopes.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
