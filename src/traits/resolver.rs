//! Resolver traits for token resolution.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::internal::{AsyncDisposer, BoxFutureUnit, SyncDisposer};
use crate::token::Token;
use crate::traits::{AsyncDispose, Dispose};

/// Core resolver trait for object-safe resolution.
///
/// Implemented by [`ContainerInstance`](crate::ContainerInstance),
/// [`DefaultContainer`](crate::DefaultContainer) and the
/// [`ResolverContext`](crate::ResolverContext) handed to factories. Most code
/// uses the typed methods of [`Resolver`] instead.
pub trait ResolverCore: Send + Sync {
    /// Resolves a token to its type-erased value.
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<dyn Any>)` - The resolved value
    /// * `Err(DiError)` - Unresolved token, disposed container, circular chain, ...
    fn resolve_any(&self, token: &Token) -> DiResult<Arc<dyn Any + Send + Sync>>;

    /// Registers a synchronous teardown hook on this resolver's container.
    fn push_sync_disposer(&self, f: SyncDisposer);

    /// Registers an asynchronous teardown hook on this resolver's container.
    fn push_async_disposer(&self, f: AsyncDisposer);
}

/// Typed resolution interface built on [`ResolverCore`].
///
/// # Examples
///
/// ```
/// use scoped_container::{Provider, Resolver, ScopeRegistry};
///
/// let registry = ScopeRegistry::new();
/// let scope = registry.create_scope("r1".into()).unwrap();
/// scope.set("greeting", "hello".to_string()).unwrap();
/// scope.register_scoped(Provider::value(42usize)).unwrap();
///
/// let greeting = scope.resolve::<String>("greeting").unwrap();
/// assert_eq!(greeting.as_str(), "hello");
/// assert_eq!(*scope.get::<usize>().unwrap(), 42);
/// assert!(scope.try_resolve::<u8>("missing").unwrap().is_none());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves `token` and downcasts the value to `T`.
    fn resolve<T: Send + Sync + 'static>(&self, token: impl Into<Token>) -> DiResult<Arc<T>> {
        let token = token.into();
        let any = self.resolve_any(&token)?;
        any.downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves the type token of `T`.
    fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.resolve::<T>(Token::of::<T>())
    }

    /// Like [`resolve`](Self::resolve), but an unbound `token` yields `Ok(None)`.
    ///
    /// Errors raised while building the value (including unresolved
    /// dependencies of its factory) are still returned as errors.
    fn try_resolve<T: Send + Sync + 'static>(
        &self,
        token: impl Into<Token>,
    ) -> DiResult<Option<Arc<T>>> {
        let token = token.into();
        match self.resolve::<T>(&token) {
            Ok(value) => Ok(Some(value)),
            Err(DiError::UnresolvedToken(missing)) if missing == token => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Runs `service.dispose()` when this resolver's container is disposed.
    fn register_disposer<T>(&self, service: Arc<T>)
    where
        T: Dispose + 'static,
    {
        self.push_sync_disposer(Box::new(move || service.dispose()));
    }

    /// Runs `service.dispose().await` when this resolver's container is disposed asynchronously.
    fn register_async_disposer<T>(&self, service: Arc<T>)
    where
        T: AsyncDispose + 'static,
    {
        self.push_async_disposer(Box::new(move || {
            Box::pin(async move { service.dispose().await }) as BoxFutureUnit
        }));
    }
}
