//! Scope identifiers and their generators.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifier of one request scope.
///
/// Opaque, comparable and cheap to clone. Built from strings, integers or
/// UUIDs; the registry only requires that no two live scopes share one.
///
/// ```rust
/// use scoped_container::ScopeId;
///
/// let a = ScopeId::from("r1");
/// let b = ScopeId::from(String::from("r1"));
/// assert_eq!(a, b);
/// assert_eq!(ScopeId::from(42u64).as_str(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(Arc<str>);

impl ScopeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScopeId {
    fn from(id: &str) -> Self {
        ScopeId(Arc::from(id))
    }
}

impl From<String> for ScopeId {
    fn from(id: String) -> Self {
        ScopeId(Arc::from(id))
    }
}

impl From<u64> for ScopeId {
    fn from(id: u64) -> Self {
        ScopeId(Arc::from(id.to_string()))
    }
}

impl From<uuid::Uuid> for ScopeId {
    fn from(id: uuid::Uuid) -> Self {
        ScopeId(Arc::from(id.to_string()))
    }
}

/// Source of scope identifiers.
///
/// Implementations must make collisions among concurrently live scopes
/// negligible. Generation has no error conditions.
pub trait IdGenerator: Send + Sync {
    /// Produces the identifier for the next request scope.
    fn next_id(&self) -> ScopeId;
}

/// Random v4 UUID identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> ScopeId {
        ScopeId::from(uuid::Uuid::new_v4())
    }
}

/// `<prefix>-<n>` identifiers from a monotonically increasing counter.
///
/// Unique for the generator's lifetime, which makes logs and tests
/// deterministic. Two generators with the same prefix will collide.
///
/// ```rust
/// use scoped_container::{IdGenerator, SequentialGenerator};
///
/// let ids = SequentialGenerator::new("req");
/// assert_eq!(ids.next_id().as_str(), "req-1");
/// assert_eq!(ids.next_id().as_str(), "req-2");
/// ```
#[derive(Debug)]
pub struct SequentialGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialGenerator {
    fn next_id(&self) -> ScopeId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        ScopeId::from(format!("{}-{}", self.prefix, n))
    }
}
