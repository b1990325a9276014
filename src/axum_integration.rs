//! Axum integration for request scopes.
//!
//! This module wires [`RequestScopeHooks`] into an axum router:
//! - [`request_scope`] middleware opens a scope before the handler runs and
//!   finalizes it once the handler's response is ready
//! - [`RequestContext`] is an extractor for handlers
//!
//! ```no_run
//! use axum::{middleware, routing::get, Router};
//! use scoped_container::axum_integration::request_scope;
//! use scoped_container::{RequestContext, RequestScopeHooks, ScopeRegistry};
//! use std::sync::Arc;
//!
//! async fn whoami(ctx: RequestContext) -> String {
//!     ctx.request_id().to_string()
//! }
//!
//! let hooks = RequestScopeHooks::new(Arc::new(ScopeRegistry::new()));
//! let app: Router = Router::new()
//!     .route("/whoami", get(whoami))
//!     .layer(middleware::from_fn_with_state(hooks, request_scope));
//! ```

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::DiError;
use crate::lifecycle::{RequestScopeHooks, ResponseFinalizer};
use crate::request::RequestContext;

/// Middleware opening one request scope per request.
///
/// Install with `axum::middleware::from_fn_with_state(hooks, request_scope)`.
/// The scope is disposed before the response leaves the middleware; if the
/// request future is dropped first, a [`ScopeGuard`](crate::ScopeGuard)
/// disposes it instead.
pub async fn request_scope(
    State(hooks): State<RequestScopeHooks>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = match hooks.open() {
        Ok(context) => context,
        Err(e) => {
            tracing::error!(error = %e, "failed to open request scope");
            return e.into_response();
        }
    };
    let guard = hooks.guard(&context);

    request.extensions_mut().insert(context.clone());
    let response = next.run(request).await;
    let response = hooks.finalize(response, &context).await;

    guard.disarm();
    response
}

/// Rejection for the [`RequestContext`] extractor.
#[derive(Debug, thiserror::Error)]
pub enum ScopeRejection {
    #[error("No request scope found; install the request_scope middleware")]
    MissingContext,
}

impl IntoResponse for ScopeRejection {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

impl IntoResponse for DiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ScopeRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or(ScopeRejection::MissingContext)
    }
}
