//! Providers and their type-erased registrations.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::container::ResolverContext;
use crate::error::DiResult;
use crate::internal::SyncDisposer;
use crate::lifetime::Lifetime;
use crate::traits::Dispose;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

type Factory<T> = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync>;
pub(crate) type Ctor = Factory<AnyArc>;
pub(crate) type Teardown = Arc<dyn Fn(&AnyArc) + Send + Sync>;

/// Memoization cell for one cached token; initialized at most once.
pub(crate) type Slot = Arc<OnceCell<AnyArc>>;

/// A slot already holding `value`.
pub(crate) fn filled_slot(value: AnyArc) -> Slot {
    Arc::new(OnceCell::with_value(value))
}

enum Source<T> {
    Value(Arc<T>),
    Factory(Factory<T>),
}

/// Recipe bound to a token: a value or a factory, plus an optional teardown.
///
/// Factories receive a [`ResolverContext`] for the container performing the
/// resolution, so they can pull other tokens out of the same scope.
///
/// # Examples
///
/// ```
/// use scoped_container::{Provider, Resolver, ScopeRegistry};
///
/// struct Config { url: String }
/// struct Client { url: String }
///
/// let registry = ScopeRegistry::new();
/// let scope = registry.create_scope("r1".into()).unwrap();
///
/// scope.register_scoped(Provider::value(Config { url: "http://api".into() })).unwrap();
/// scope.register_scoped(Provider::try_factory(|r| {
///     let config = r.get::<Config>()?;
///     Ok(Client { url: config.url.clone() })
/// })).unwrap();
///
/// assert_eq!(scope.get::<Client>().unwrap().url, "http://api");
/// ```
pub struct Provider<T> {
    source: Source<T>,
    teardown: Option<Arc<dyn Fn(&T) + Send + Sync>>,
}

impl<T: Send + Sync + 'static> Provider<T> {
    /// A concrete value.
    pub fn value(value: T) -> Self {
        Self::shared(Arc::new(value))
    }

    /// A concrete value that is already shared.
    pub fn shared(value: Arc<T>) -> Self {
        Self {
            source: Source::Value(value),
            teardown: None,
        }
    }

    /// An infallible factory.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        Self::try_factory(move |r: &ResolverContext<'_>| Ok(factory(r)))
    }

    /// A factory whose errors propagate to the caller of `resolve`.
    pub fn try_factory<F>(factory: F) -> Self
    where
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        Self {
            source: Source::Factory(Arc::new(factory)),
            teardown: None,
        }
    }

    /// Runs `teardown` on the produced instance when its container is disposed.
    ///
    /// Only instances the container keeps (scoped and singleton) are torn down.
    pub fn with_teardown<F>(mut self, teardown: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.teardown = Some(Arc::new(teardown));
        self
    }

    pub fn is_value(&self) -> bool {
        matches!(self.source, Source::Value(_))
    }

    pub(crate) fn into_registration(self, lifetime: Lifetime) -> Registration {
        let source = match self.source {
            Source::Value(value) => ErasedSource::Value(value as AnyArc),
            Source::Factory(factory) => {
                let ctor: Ctor = Arc::new(move |r: &ResolverContext<'_>| {
                    factory(r).map(|value| Arc::new(value) as AnyArc)
                });
                ErasedSource::Factory(ctor)
            }
        };
        let teardown = self.teardown.map(|teardown| {
            let erased: Teardown = Arc::new(move |any: &AnyArc| {
                if let Some(value) = (**any).downcast_ref::<T>() {
                    teardown(value);
                }
            });
            erased
        });
        Registration {
            lifetime,
            source,
            teardown,
        }
    }
}

impl<T: Dispose> Provider<T> {
    /// Uses the instance's [`Dispose`] implementation as its teardown.
    pub fn disposable(self) -> Self {
        self.with_teardown(|value: &T| value.dispose())
    }
}

impl<T> fmt::Debug for Provider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.source {
            Source::Value(_) => "value",
            Source::Factory(_) => "factory",
        };
        f.debug_struct("Provider")
            .field("type", &std::any::type_name::<T>())
            .field("source", &kind)
            .field("teardown", &self.teardown.is_some())
            .finish()
    }
}

#[derive(Clone)]
pub(crate) enum ErasedSource {
    Value(AnyArc),
    Factory(Ctor),
}

/// Binding with reuse policy and constructor
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) lifetime: Lifetime,
    pub(crate) source: ErasedSource,
    pub(crate) teardown: Option<Teardown>,
}

impl Registration {
    /// Produces an instance, invoking the factory if there is one.
    pub(crate) fn produce(&self, ctx: &ResolverContext<'_>) -> DiResult<AnyArc> {
        match &self.source {
            ErasedSource::Value(value) => Ok(value.clone()),
            ErasedSource::Factory(ctor) => ctor(ctx),
        }
    }

    /// The stored value of a value provider.
    pub(crate) fn value(&self) -> Option<&AnyArc> {
        match &self.source {
            ErasedSource::Value(value) => Some(value),
            ErasedSource::Factory(_) => None,
        }
    }

    /// True if both registrations came from the same provider.
    pub(crate) fn same_provider(&self, other: &Registration) -> bool {
        match (&self.source, &other.source) {
            (ErasedSource::Value(a), ErasedSource::Value(b)) => Arc::ptr_eq(a, b),
            (ErasedSource::Factory(a), ErasedSource::Factory(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Teardown hook bound to `instance`, if the provider declared one.
    pub(crate) fn teardown_for(&self, instance: AnyArc) -> Option<SyncDisposer> {
        let teardown = self.teardown.clone()?;
        let hook: SyncDisposer = Box::new(move || teardown(&instance));
        Some(hook)
    }
}
