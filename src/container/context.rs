//! Resolver context handed to provider factories.

use crate::error::DiResult;
use crate::internal::{AsyncDisposer, SyncDisposer};
use crate::registration::AnyArc;
use crate::token::Token;
use crate::traits::{Resolver, ResolverCore};

/// Context passed to factory functions for resolving dependencies.
///
/// Wraps the container that is performing the resolution: the scope's
/// [`ContainerInstance`](crate::ContainerInstance) for scoped and transient
/// bindings, the [`DefaultContainer`](crate::DefaultContainer) for singletons.
/// Disposers registered through it attach to that same container.
///
/// # Examples
///
/// ```
/// use scoped_container::{Provider, RequestContext, Resolver, ScopeRegistry, CONTEXT_TOKEN};
///
/// struct AuditLog { request_id: String }
///
/// let registry = ScopeRegistry::new();
/// let scope = registry.create_scope("r1".into()).unwrap();
/// scope.set(CONTEXT_TOKEN, RequestContext::new("r1".into(), scope.clone())).unwrap();
///
/// scope.register_scoped(Provider::try_factory(|r| {
///     // `r` resolves from the same scope as the caller
///     let ctx = r.resolve::<RequestContext>(CONTEXT_TOKEN)?;
///     Ok(AuditLog { request_id: ctx.request_id().to_string() })
/// })).unwrap();
///
/// assert_eq!(scope.get::<AuditLog>().unwrap().request_id, "r1");
/// # registry.dispose_scope(&"r1".into());
/// ```
pub struct ResolverContext<'a> {
    resolver: &'a dyn ResolverCore,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new<T>(resolver: &'a T) -> Self
    where
        T: ResolverCore,
    {
        Self { resolver }
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_any(&self, token: &Token) -> DiResult<AnyArc> {
        self.resolver.resolve_any(token)
    }

    fn push_sync_disposer(&self, f: SyncDisposer) {
        self.resolver.push_sync_disposer(f);
    }

    fn push_async_disposer(&self, f: AsyncDisposer) {
        self.resolver.push_async_disposer(f);
    }
}

impl Resolver for ResolverContext<'_> {}

impl std::fmt::Debug for ResolverContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverContext").finish_non_exhaustive()
    }
}

