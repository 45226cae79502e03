use crate::{SourceFile, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four error classes a program can fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The lexer met a character outside the language's alphabet.
    IllegalCharacter,
    /// The parser met a token sequence the grammar does not allow.
    Syntax,
    /// Evaluation failed: undefined name, type mismatch, arity mismatch,
    /// division by zero, built-in validation failure, import failure.
    Runtime,
    /// Execution was aborted from outside (operator interrupt).
    Interrupted,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalCharacter => write!(f, "Illegal character"),
            Self::Syntax => write!(f, "Syntax error"),
            Self::Runtime => write!(f, "Runtime error"),
            Self::Interrupted => write!(f, "Interrupted"),
        }
    }
}

/// One frame of the context chain: which call or module the error
/// passed through on its way out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceFrame {
    /// Display name of the context, e.g. `<stdin>` or `fib`.
    pub context: String,
    /// Where inside that context execution was when the error surfaced.
    pub span: Span,
}

/// A structured interpreter diagnostic.
///
/// Carries everything needed to render a pointed-at message: the error
/// kind, the offending span, the exact source line, and the chain of
/// calling contexts. Rendering is done by the `Display` impl; embedders
/// that want machine-readable output can serialize the struct instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkError {
    /// Source name the error was raised in (file path or `<stdin>`).
    pub file: String,
    pub kind: ErrorKind,
    /// Human-readable description of what went wrong.
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    /// The source line the span starts on, for the caret rendering.
    pub source_line: String,
    /// Call/import chain, innermost frame first.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub trace: Vec<TraceFrame>,
}

impl ThinkError {
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        span: Span,
        source: &SourceFile,
    ) -> Self {
        Self {
            file: source.name.clone(),
            kind,
            message: message.into(),
            span,
            source_line: source.line(span.start_line).unwrap_or("").to_string(),
            trace: Vec::new(),
        }
    }

    /// Build an error without a source file at hand (e.g. a missing
    /// module, where there is no line to point at).
    pub fn bare(kind: ErrorKind, message: impl Into<String>, span: Span, file: &str) -> Self {
        Self {
            file: file.to_string(),
            kind,
            message: message.into(),
            span,
            source_line: String::new(),
            trace: Vec::new(),
        }
    }

    /// Append a frame to the context chain (outermost last).
    pub fn with_frame(mut self, context: impl Into<String>, span: Span) -> Self {
        self.trace.push(TraceFrame {
            context: context.into(),
            span,
        });
        self
    }

    fn caret_line(&self) -> String {
        let line_len = self.source_line.chars().count();
        let start = (self.span.start_col.saturating_sub(1) as usize).min(line_len);
        let end = if self.span.end_line == self.span.start_line {
            (self.span.end_col as usize).min(line_len).max(start + 1)
        } else {
            line_len.max(start + 1)
        };
        format!("{}{}", " ".repeat(start), "^".repeat(end - start))
    }
}

impl fmt::Display for ThinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.trace.is_empty() {
            writeln!(f, "Traceback (most recent call last):")?;
            for frame in self.trace.iter().rev() {
                writeln!(
                    f,
                    "  File {}, line {}, in {}",
                    self.file, frame.span.start_line, frame.context
                )?;
            }
        }
        writeln!(
            f,
            "{}: {} (file {}, line {})",
            self.kind, self.message, self.file, self.span.start_line
        )?;
        if !self.source_line.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", self.source_line)?;
            write!(f, "{}", self.caret_line())?;
        }
        Ok(())
    }
}

impl std::error::Error for ThinkError {}
