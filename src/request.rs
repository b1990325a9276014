//! The per-request context record.

use std::sync::Arc;

use crate::container::ContainerInstance;
use crate::error::DiResult;
use crate::id::ScopeId;
use crate::token::Token;
use crate::traits::Resolver;

/// Token under which every request context is registered in its own container.
pub const CONTEXT_TOKEN: &str = "context";

/// Request-specific data threaded through resolver code.
///
/// Created once per request by the context factory, which also registers it
/// inside its own container under [`CONTEXT_TOKEN`], so factories can depend
/// on "the current request" through the container instead of global state.
/// The container's reference back to the context is released when the scope
/// is disposed.
///
/// Cloning is cheap; clones share the container.
///
/// # Examples
///
/// ```
/// use scoped_container::{RequestContext, Resolver, ScopeRegistry, CONTEXT_TOKEN};
/// use std::sync::Arc;
///
/// let registry = ScopeRegistry::new();
/// let container = registry.create_scope("r1".into()).unwrap();
/// let context = RequestContext::new("r1".into(), container.clone());
/// container.set(CONTEXT_TOKEN, context.clone()).unwrap();
///
/// let current = RequestContext::current(&container).unwrap();
/// assert_eq!(current.request_id().as_str(), "r1");
/// assert!(Arc::ptr_eq(current.container(), &container));
/// # registry.dispose_all();
/// ```
#[derive(Clone)]
pub struct RequestContext {
    request_id: ScopeId,
    container: Arc<ContainerInstance>,
}

impl RequestContext {
    pub fn new(request_id: ScopeId, container: Arc<ContainerInstance>) -> Self {
        Self {
            request_id,
            container,
        }
    }

    pub fn request_id(&self) -> &ScopeId {
        &self.request_id
    }

    /// The container scoped to this request.
    pub fn container(&self) -> &Arc<ContainerInstance> {
        &self.container
    }

    /// The token contexts are registered under.
    pub fn token() -> Token {
        Token::named(CONTEXT_TOKEN)
    }

    /// The context registered in `container`.
    pub fn current(container: &ContainerInstance) -> DiResult<Arc<RequestContext>> {
        container.resolve::<RequestContext>(CONTEXT_TOKEN)
    }

    /// Resolves `token` from this request's container.
    pub fn resolve<T: Send + Sync + 'static>(&self, token: impl Into<Token>) -> DiResult<Arc<T>> {
        self.container.resolve(token)
    }

    /// Resolves the type token of `T` from this request's container.
    pub fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.container.get()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("state", &self.container.state())
            .finish()
    }
}
