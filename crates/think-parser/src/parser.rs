//! Core parser infrastructure: token cursor, error helpers, statements.
//!
//! The parser is recursive-descent and fails fast: the first token the
//! grammar cannot accept aborts the parse with a syntax error carrying
//! that token's position and an expected-token description.

use think_lexer::token::{Token, TokenKind};
use think_types::ast::{Node, NodeKind};
use think_types::{ErrorKind, Result, SourceFile, Span, ThinkError};

/// The ThinkLang parser.
///
/// Consumes a token stream produced by the lexer and builds one AST
/// root: a program is a statement sequence wrapped in an implicit
/// [`NodeKind::List`].
pub struct Parser<'src> {
    /// The token stream (ends with `Eof`).
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Source file for error context.
    source_file: &'src SourceFile,
}

impl<'src> Parser<'src> {
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
        }
    }

    /// Parse the token stream into the program's root node.
    pub fn parse(mut self) -> Result<Node> {
        let root = self.parse_statements(&[])?;
        if !self.at_end() {
            return Err(self.error_at_current(format!(
                "Expected end of input, got '{}'",
                self.peek_kind()
            )));
        }
        Ok(root)
    }

    // ── Token cursor ──────────────────────────────────────────────────────

    pub(crate) fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens
                .last()
                .expect("token stream always ends with Eof")
        })
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    pub(crate) fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::point(1, 1)
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Look ahead by `n` tokens from the current position.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    // ── Expect helpers ────────────────────────────────────────────────────

    /// Expect a specific token kind, or fail with a syntax error.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Result<Token> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(format!(
                "Expected '{expected}', got '{}'",
                self.peek_kind()
            )))
        }
    }

    /// Expect an identifier token; returns its name and span.
    pub(crate) fn expect_identifier(&mut self) -> Result<(String, Span)> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Ok((name, span))
            }
            other => Err(self.error_at_current(format!("Expected identifier, got '{other}'"))),
        }
    }

    /// Expect a string literal token; returns its value.
    pub(crate) fn expect_string(&mut self) -> Result<(String, Span)> {
        match self.peek_kind().clone() {
            TokenKind::Str(value) => {
                let span = self.advance().span;
                Ok((value, span))
            }
            other => {
                Err(self.error_at_current(format!("Expected string literal, got '{other}'")))
            }
        }
    }

    pub(crate) fn error_at_current(&self, message: impl Into<String>) -> ThinkError {
        ThinkError::new(
            ErrorKind::Syntax,
            message,
            self.current_span(),
            self.source_file,
        )
    }

    // ── Statements ────────────────────────────────────────────────────────

    /// Skip all consecutive statement separators.
    pub(crate) fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn at_terminator(&self, terminators: &[TokenKind]) -> bool {
        self.at_end() || terminators.iter().any(|t| self.check(t))
    }

    /// Parse a separator-delimited statement sequence into an implicit
    /// List node. Stops (without consuming) at `Eof` or any token in
    /// `terminators` — block callers consume their own `end`/`elif`/`else`.
    pub(crate) fn parse_statements(&mut self, terminators: &[TokenKind]) -> Result<Node> {
        let start = self.current_span();
        let mut statements = Vec::new();

        self.skip_newlines();
        while !self.at_terminator(terminators) {
            statements.push(self.parse_statement()?);
            // Statements are separated by at least one newline or `;`.
            if self.check(&TokenKind::Newline) {
                self.skip_newlines();
            } else {
                break;
            }
        }

        let span = start.to(self.previous_span());
        Ok(Node::new(NodeKind::List(statements), span))
    }

    /// Parse a single statement.
    pub(crate) fn parse_statement(&mut self) -> Result<Node> {
        let start = self.current_span();
        match self.peek_kind() {
            TokenKind::Return => {
                self.advance();
                let value = if self.return_has_operand() {
                    Some(Box::new(self.parse_expression()?))
                } else {
                    None
                };
                let span = start.to(self.previous_span());
                Ok(Node::new(NodeKind::Return(value), span))
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                Ok(Node::new(NodeKind::Continue, span))
            }
            TokenKind::Break => {
                let span = self.advance().span;
                Ok(Node::new(NodeKind::Break, span))
            }
            _ => self.parse_expression(),
        }
    }

    /// A `return` carries an operand unless the statement ends here.
    fn return_has_operand(&self) -> bool {
        !matches!(
            self.peek_kind(),
            TokenKind::Newline
                | TokenKind::Eof
                | TokenKind::End
                | TokenKind::Elif
                | TokenKind::Else
        )
    }
}
