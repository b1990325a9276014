//! Error types for scoped containers and the scope registry.

use crate::id::ScopeId;
use crate::token::Token;

/// Dependency injection errors
///
/// Represents the various error conditions that can occur while creating,
/// looking up or disposing scopes, and while resolving tokens from a
/// container.
///
/// Registry and container errors are never retried internally. They point at
/// a programming error in the host (a colliding id, a stale container handle,
/// a missing binding) and are meant to surface on the failing request's error
/// path.
///
/// # Examples
///
/// ```rust
/// use scoped_container::{DiError, ScopeRegistry};
///
/// let registry = ScopeRegistry::new();
/// match registry.get_scope(&"r1".into()) {
///     Err(DiError::ScopeNotFound(id)) => assert_eq!(id.as_str(), "r1"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiError {
    /// A scope with this identifier is already registered
    #[error("Scope already registered: {0}")]
    DuplicateScope(ScopeId),
    /// No scope is registered under this identifier
    #[error("Scope not found: {0}")]
    ScopeNotFound(ScopeId),
    /// No provider for the token in the scope chain
    #[error("Unresolved token: {0}")]
    UnresolvedToken(Token),
    /// The container was used after its scope was disposed
    #[error("Container disposed: {0}")]
    ContainerDisposed(ScopeId),
    /// Stored value could not be downcast to the requested type
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<String>),
    /// Maximum resolution depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// Invalid registry configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DiError {
    /// Returns true for the error a lookup produces when nothing is bound.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, DiError::UnresolvedToken(_))
    }
}

/// Result type for DI operations
///
/// A convenience alias for `Result<T, DiError>` used throughout the crate.
///
/// ```rust
/// use scoped_container::{DiError, DiResult, Token};
///
/// fn lookup() -> DiResult<u32> {
///     Err(DiError::UnresolvedToken(Token::named("port")))
/// }
///
/// assert!(lookup().unwrap_err().is_unresolved());
/// ```
pub type DiResult<T> = Result<T, DiError>;
