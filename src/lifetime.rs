//! Reuse policies for bindings.

/// Reuse policy controlling instance caching behavior
///
/// Decides how often a provider's factory runs and where the produced
/// instance lives.
///
/// # Examples
///
/// ```rust
/// use scoped_container::{Lifetime, Provider, Resolver, ScopeRegistry};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { db_url: String }
/// struct RequestModel { id: u32 }
///
/// let registry = ScopeRegistry::new();
/// let r1 = registry.create_scope("r1".into()).unwrap();
/// let r2 = registry.create_scope("r2".into()).unwrap();
///
/// // Singleton: forwarded to the default container, shared by every scope
/// r1.register_singleton(
///     Provider::value(Database { url: "postgres://localhost".to_string() }),
/// ).unwrap();
/// let db1 = r1.get::<Database>().unwrap();
/// let db2 = r2.get::<Database>().unwrap();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// // Scoped: one instance per container
/// r1.register_scoped(Provider::try_factory(|r| {
///     let db = r.get::<Database>()?;
///     Ok(Repository { db_url: db.url.clone() })
/// })).unwrap();
/// let repo1a = r1.get::<Repository>().unwrap();
/// let repo1b = r1.get::<Repository>().unwrap();
/// assert!(Arc::ptr_eq(&repo1a, &repo1b));
///
/// // Transient: new instance every time
/// r1.register_transient(Provider::factory(|_| RequestModel { id: 7 })).unwrap();
/// let m1 = r1.get::<RequestModel>().unwrap();
/// let m2 = r1.get::<RequestModel>().unwrap();
/// assert!(!Arc::ptr_eq(&m1, &m2));
/// assert_eq!(m1.id, 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// Single instance shared across all scopes
    ///
    /// Bindings registered with this lifetime through a container are stored
    /// in the default container, so every scope of the registry sees the
    /// same instance.
    Singleton,
    /// Single instance per container, cached until the scope is disposed
    #[default]
    Scoped,
    /// New instance per resolution, never cached
    ///
    /// Transient instances are not tracked, so teardown callbacks attached to
    /// a transient provider never run.
    Transient,
}

impl Lifetime {
    /// Returns true if resolved instances are memoized.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Lifetime::Singleton | Lifetime::Scoped)
    }
}
