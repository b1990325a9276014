//! Internal disposal bag for managing teardown hooks.

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;

/// Future type for disposal operations.
pub(crate) type BoxFutureUnit = Pin<Box<dyn Future<Output = ()> + Send>>;

pub(crate) type SyncDisposer = Box<dyn FnOnce() + Send>;
pub(crate) type AsyncDisposer = Box<dyn FnOnce() -> BoxFutureUnit + Send>;

/// Container for teardown hooks with LIFO execution order.
///
/// Async hooks are executed first (in reverse order), followed by sync hooks.
#[derive(Default)]
pub(crate) struct DisposeBag {
    sync: Vec<SyncDisposer>,
    asyncs: Vec<AsyncDisposer>,
}

impl DisposeBag {
    pub(crate) fn push_sync(&mut self, f: SyncDisposer) {
        self.sync.push(f);
    }

    pub(crate) fn push_async(&mut self, f: AsyncDisposer) {
        self.asyncs.push(f);
    }

    /// Execute all sync hooks in reverse order (LIFO).
    ///
    /// A panicking hook is logged and the remaining hooks still run.
    pub(crate) fn run_all_sync_reverse(&mut self) {
        while let Some(f) = self.sync.pop() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(f)) {
                tracing::error!(panic = %panic_message(&*payload), "teardown callback panicked");
            }
        }
    }

    /// Execute all async hooks in reverse order (LIFO).
    pub(crate) async fn run_all_async_reverse(&mut self) {
        while let Some(f) = self.asyncs.pop() {
            (f)().await;
        }
    }

    /// Drops pending async hooks without running them, returning how many were dropped.
    pub(crate) fn discard_async(&mut self) -> usize {
        let dropped = self.asyncs.len();
        self.asyncs.clear();
        dropped
    }

    /// Check if the bag is empty (no disposers registered).
    pub(crate) fn is_empty(&self) -> bool {
        self.sync.is_empty() && self.asyncs.is_empty()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
