//! Token types identifying bindings in a container.

use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(0);

/// Key for binding storage and lookup.
///
/// Tokens identify a dependency inside a [`ContainerInstance`](crate::ContainerInstance)
/// or the [`DefaultContainer`](crate::DefaultContainer). They are comparable,
/// hashable and stable for the lifetime of the process.
///
/// # Token Kinds
///
/// - **Type**: a type marker, built with [`Token::of`]
/// - **Name**: a string key such as `"context"`
/// - **Symbol**: a process-unique key built with [`Token::symbol`]; two symbols
///   never compare equal even when their descriptions match
///
/// # Examples
///
/// ```rust
/// use scoped_container::Token;
///
/// struct Database;
///
/// assert_eq!(Token::of::<Database>(), Token::of::<Database>());
/// assert_eq!(Token::from("context"), Token::named("context"));
///
/// let a = Token::symbol("cache");
/// let b = Token::symbol("cache");
/// assert_ne!(a, b);
/// assert_eq!(a, a.clone());
/// ```
#[derive(Debug, Clone)]
pub enum Token {
    /// Type marker with TypeId and name for diagnostics
    Type(TypeId, &'static str),
    /// String key
    Name(Cow<'static, str>),
    /// Unique symbol with a description for diagnostics
    Symbol(u64, &'static str),
}

impl Token {
    /// Token for the type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Token::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Token for a string key.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Token::Name(name.into())
    }

    /// Creates a new symbol distinct from every other symbol in the process.
    pub fn symbol(description: &'static str) -> Self {
        Token::Symbol(NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed), description)
    }

    /// Human-readable name used in errors and logs.
    pub fn display_name(&self) -> &str {
        match self {
            Token::Type(_, name) => name,
            Token::Name(name) => name,
            Token::Symbol(_, description) => description,
        }
    }
}

// Type and symbol tokens compare on identity only, names are diagnostic
impl PartialEq for Token {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::Type(a, _), Token::Type(b, _)) => a == b,
            (Token::Name(a), Token::Name(b)) => a == b,
            (Token::Symbol(a, _), Token::Symbol(b, _)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Token {}

impl std::hash::Hash for Token {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Token::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Token::Name(name) => {
                1u8.hash(state);
                name.hash(state);
            }
            Token::Symbol(id, _) => {
                2u8.hash(state);
                id.hash(state);
            }
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Type(_, name) => f.write_str(name),
            Token::Name(name) => write!(f, "{:?}", name),
            Token::Symbol(id, description) => write!(f, "Symbol({}#{})", description, id),
        }
    }
}

impl From<&'static str> for Token {
    fn from(name: &'static str) -> Self {
        Token::Name(Cow::Borrowed(name))
    }
}

impl From<String> for Token {
    fn from(name: String) -> Self {
        Token::Name(Cow::Owned(name))
    }
}

impl From<&Token> for Token {
    fn from(token: &Token) -> Self {
        token.clone()
    }
}
