//! # scoped-container
//!
//! Per-request dependency injection scopes for async servers.
//!
//! Every incoming request gets its own [`ContainerInstance`], registered in a
//! [`ScopeRegistry`] under a unique [`ScopeId`]. Resolver code pulls its
//! dependencies from that container; tokens it does not bind fall through to
//! a [`DefaultContainer`] shared by all scopes. When the response is ready the
//! scope is disposed, its teardowns run, and no data survives into another
//! request.
//!
//! ## Features
//!
//! - **Isolation**: scoped bindings never leak between concurrent requests
//! - **Reuse policies**: scoped, singleton and transient bindings
//! - **Teardowns**: sync and async disposal hooks, run LIFO on dispose
//! - **Lifecycle hooks**: a context factory and response finalizer pair
//! - **Circular dependency detection**: factory cycles fail with the chain
//!
//! ## Quick Start
//!
//! ```rust
//! use scoped_container::{DiError, Provider, Resolver, ScopeRegistry};
//! use std::sync::Arc;
//!
//! struct Database { url: String }
//! struct Session { user: String, db: Arc<Database> }
//!
//! let registry = ScopeRegistry::new();
//! registry.defaults().register_singleton(Provider::value(Database {
//!     url: "postgres://localhost".to_string(),
//! }));
//!
//! let scope = registry.create_scope("r1".into()).unwrap();
//! scope.set("user", "alice".to_string()).unwrap();
//! scope.register_scoped(Provider::try_factory(|r| {
//!     Ok(Session {
//!         user: r.resolve::<String>("user")?.to_string(),
//!         db: r.get::<Database>()?,
//!     })
//! })).unwrap();
//!
//! let session = scope.get::<Session>().unwrap();
//! assert_eq!(session.user, "alice");
//! assert_eq!(session.db.url, "postgres://localhost");
//!
//! registry.dispose_scope(&"r1".into());
//! assert!(matches!(registry.get_scope(&"r1".into()), Err(DiError::ScopeNotFound(_))));
//! ```
//!
//! ## Request Lifecycle
//!
//! [`RequestScopeHooks`] implements [`ContextFactory`] and
//! [`ResponseFinalizer`]. Call the factory before any resolver runs and the
//! finalizer right before the response is sent, or let
//! [`RequestScopeHooks::run`] do both. With the `axum-integration` feature,
//! `axum_integration::request_scope` does the same as router middleware.
//!
//! ## Optional features
//!
//! - `config`: JSON loading for [`RegistryConfig`]
//! - `axum-integration`: axum middleware and extractor

pub mod config;
pub mod container;
pub mod error;
pub mod id;
pub mod lifecycle;
pub mod lifetime;
pub mod registry;
pub mod request;
pub mod token;
pub mod traits;

#[cfg(feature = "axum-integration")]
pub mod axum_integration;

mod internal;
mod registration;

pub use config::{RegistryConfig, DEFAULT_ENV_PREFIX};
pub use container::{ContainerInstance, ContainerState, DefaultContainer, ResolverContext};
pub use error::{DiError, DiResult};
pub use id::{IdGenerator, ScopeId, SequentialGenerator, UuidGenerator};
pub use lifecycle::{ContextFactory, RequestScopeHooks, ResponseFinalizer, ScopeGuard};
pub use lifetime::Lifetime;
pub use registration::Provider;
pub use registry::ScopeRegistry;
pub use request::{RequestContext, CONTEXT_TOKEN};
pub use token::Token;
pub use traits::{AsyncDispose, Dispose, Resolver, ResolverCore};
