use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location span.
///
/// Line and column values are 1-based, matching what an editor shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    /// Create a span from explicit start/end coordinates.
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Create a zero-width span at a single position.
    pub fn point(line: u32, col: u32) -> Self {
        Self::new(line, col, line, col)
    }

    /// Extend this span to cover `other` as well.
    ///
    /// Assumes `self` starts no later than `other` ends, which holds for
    /// every parser production (nodes are built left to right).
    pub fn to(self, other: Span) -> Span {
        Span::new(
            self.start_line,
            self.start_col,
            other.end_line,
            other.end_col,
        )
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// A named piece of source text, kept around for error reporting.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    /// Byte offset of the start of each line.
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Extract a source line by 1-based line number, without its newline.
    pub fn line(&self, line_number: u32) -> Option<&str> {
        let idx = line_number.checked_sub(1)? as usize;
        let start = *self.line_starts.get(idx)?;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&next| next.saturating_sub(1))
            .unwrap_or(self.source.len());
        Some(self.source[start..end].trim_end_matches('\r'))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Build a caret line pointing at `span` within its first source line.
    ///
    /// `"x + y"` with a span over `y` renders as `"    ^"`. Spans that run
    /// past the end of the line are clipped to the line.
    pub fn caret_line(&self, span: Span) -> String {
        let line_len = self
            .line(span.start_line)
            .map(|l| l.chars().count())
            .unwrap_or(0);
        let start = (span.start_col.saturating_sub(1) as usize).min(line_len);
        let end = if span.end_line == span.start_line {
            (span.end_col as usize).min(line_len).max(start + 1)
        } else {
            line_len.max(start + 1)
        };
        let mut out = " ".repeat(start);
        out.push_str(&"^".repeat(end - start));
        out
    }
}
