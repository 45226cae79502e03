//! The unified non-value evaluation outcome.
//!
//! Every evaluation step returns `Flow<Value>`: either a value, or one
//! of the unwinding signals below. Propagation is ordinary `?`
//! composition — loops intercept `Break`/`Continue`, function calls
//! intercept `Return`, and errors travel all the way out.

use crate::value::Value;
use thiserror::Error;
use think_types::ThinkError;

/// A non-value outcome unwinding through the evaluator.
#[derive(Debug, Error)]
pub enum Unwind {
    /// `return [expr]` — consumed by the nearest function call.
    #[error("return")]
    Return(Value),
    /// `break` — consumed by the nearest enclosing loop.
    #[error("break")]
    Break,
    /// `continue` — consumed by the nearest enclosing loop.
    #[error("continue")]
    Continue,
    /// A terminal diagnostic. Never consumed below the `run` boundary.
    #[error(transparent)]
    Error(Box<ThinkError>),
}

impl From<ThinkError> for Unwind {
    fn from(err: ThinkError) -> Self {
        Unwind::Error(Box::new(err))
    }
}

/// Result alias used by every evaluation step.
pub type Flow<T> = Result<T, Unwind>;
