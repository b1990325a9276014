//! Circular dependency detection infrastructure.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::token::Token;

const MAX_DEPTH: usize = 1024;

// Factories are synchronous, so one resolution chain never leaves its thread
thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<Token>> = const { RefCell::new(Vec::new()) };
}

/// Guard for managing the thread-local resolution stack
pub(crate) struct StackGuard {
    _private: (),
}

impl StackGuard {
    pub(crate) fn enter(token: &Token) -> DiResult<Self> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            if stack.iter().any(|t| t == token) {
                let mut path: Vec<String> =
                    stack.iter().map(|t| t.display_name().to_string()).collect();
                path.push(token.display_name().to_string());
                return Err(DiError::Circular(path));
            }

            if stack.len() >= MAX_DEPTH {
                return Err(DiError::DepthExceeded(stack.len()));
            }

            stack.push(token.clone());
            Ok(StackGuard { _private: () })
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Execute a closure with circular dependency detection
pub(crate) fn with_circular_guard<T, F>(token: &Token, f: F) -> DiResult<T>
where
    F: FnOnce() -> DiResult<T>,
{
    let _guard = StackGuard::enter(token)?;
    f()
}
