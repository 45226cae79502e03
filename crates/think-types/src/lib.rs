//! Shared types for the ThinkLang interpreter.
//!
//! This crate defines the AST node types, source spans, and the
//! structured error type used by every stage of the pipeline
//! (lexer, parser, evaluator).

mod error;
mod span;
pub mod ast;

pub use error::{ErrorKind, ThinkError, TraceFrame};
pub use span::{SourceFile, Span};

/// Result type used throughout the interpreter pipeline.
pub type Result<T> = std::result::Result<T, ThinkError>;
