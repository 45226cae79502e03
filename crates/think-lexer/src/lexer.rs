//! Core ThinkLang lexer — converts source text to a token stream.
//!
//! Scans left to right and fails fast: the first character outside the
//! language's alphabet aborts the scan with an illegal-character error
//! carrying its exact position. Spaces and tabs are skipped; `;` and
//! literal newlines both become statement-separator tokens; `#` starts
//! a comment running to end of line.

use crate::token::{Token, TokenKind};
use think_types::{ErrorKind, Result, SourceFile, Span, ThinkError};

/// The ThinkLang lexer.
///
/// Converts source text into a vector of [`Token`]s ending in
/// [`TokenKind::Eof`]. Lexing the same source twice always yields the
/// same stream.
pub struct Lexer<'src> {
    /// The full source text as bytes.
    source: &'src [u8],
    /// Source file for error reporting.
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    col: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.source.as_bytes(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Lex the entire source into a token stream.
    pub fn lex(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn error(&self, message: impl Into<String>, span: Span) -> ThinkError {
        ThinkError::new(ErrorKind::IllegalCharacter, message, span, self.source_file)
    }

    // ─────────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan the next token, skipping whitespace and comments first.
    fn scan_token(&mut self) -> Result<Token> {
        self.skip_insignificant();

        if self.at_end() {
            return Ok(Token::new(
                TokenKind::Eof,
                Span::point(self.line, self.col),
            ));
        }

        let start_line = self.line;
        let start_col = self.col;
        let ch = self.advance().unwrap_or(b' ');

        let single = |lexer: &Self, kind| Ok(Token::new(kind, lexer.span_from(start_line, start_col)));

        match ch {
            b'\n' | b';' => single(self, TokenKind::Newline),

            b'"' => self.scan_string(start_line, start_col),
            b'0'..=b'9' => Ok(self.scan_number(ch, start_line, start_col)),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                Ok(self.scan_identifier(ch, start_line, start_col))
            }

            b'+' => single(self, TokenKind::Plus),
            b'*' => single(self, TokenKind::Star),
            b'/' => single(self, TokenKind::Slash),
            b'^' => single(self, TokenKind::Caret),
            b'%' => single(self, TokenKind::Percent),
            b'(' => single(self, TokenKind::LParen),
            b')' => single(self, TokenKind::RParen),
            b'[' => single(self, TokenKind::LBracket),
            b']' => single(self, TokenKind::RBracket),
            b',' => single(self, TokenKind::Comma),
            b'.' => single(self, TokenKind::Dot),
            b':' => single(self, TokenKind::Colon),

            // Two-character operators are matched greedily before the
            // single-character fallback.
            b'-' => {
                if self.peek() == Some(b'>') {
                    self.advance();
                    single(self, TokenKind::Arrow)
                } else {
                    single(self, TokenKind::Minus)
                }
            }
            b'=' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    single(self, TokenKind::EqEq)
                } else {
                    single(self, TokenKind::Eq)
                }
            }
            b'<' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    single(self, TokenKind::LessEq)
                } else {
                    single(self, TokenKind::Less)
                }
            }
            b'>' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    single(self, TokenKind::GreaterEq)
                } else {
                    single(self, TokenKind::Greater)
                }
            }
            b'!' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    single(self, TokenKind::BangEq)
                } else {
                    let span = self.span_from(start_line, start_col);
                    Err(self.error("Expected '=' after '!'", span))
                }
            }

            _ => {
                let span = self.span_from(start_line, start_col);
                Err(self.error(format!("Unexpected character '{}'", ch as char), span))
            }
        }
    }

    /// Skip spaces, tabs, carriage returns, and `#` comments.
    /// Newlines are significant and are NOT skipped here.
    fn skip_insignificant(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                b' ' | b'\t' | b'\r' => {
                    self.advance();
                }
                b'#' => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Scan a digit run with at most one `.` into a NUMBER token.
    ///
    /// A second `.` ends the number, so `1.2.3` lexes as `1.2`, `.`, `3`.
    fn scan_number(&mut self, first: u8, start_line: u32, start_col: u32) -> Token {
        let mut text = String::from(first as char);
        let mut seen_dot = false;

        while let Some(ch) = self.peek() {
            match ch {
                b'0'..=b'9' => {
                    text.push(ch as char);
                    self.advance();
                }
                b'.' if !seen_dot
                    && matches!(self.source.get(self.pos + 1), Some(b'0'..=b'9')) =>
                {
                    seen_dot = true;
                    text.push('.');
                    self.advance();
                }
                _ => break,
            }
        }

        let value: f64 = text.parse().unwrap_or(0.0);
        Token::new(TokenKind::Number(value), self.span_from(start_line, start_col))
    }

    /// Scan identifier-continue characters and classify against the
    /// keyword table.
    fn scan_identifier(&mut self, first: u8, start_line: u32, start_col: u32) -> Token {
        let mut text = String::from(first as char);
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == b'_' {
                text.push(ch as char);
                self.advance();
            } else {
                break;
            }
        }

        let kind =
            TokenKind::from_keyword(&text).unwrap_or_else(|| TokenKind::Identifier(text));
        Token::new(kind, self.span_from(start_line, start_col))
    }

    /// Scan a string literal after its opening `"`, resolving escapes.
    fn scan_string(&mut self, start_line: u32, start_col: u32) -> Result<Token> {
        let mut buf = String::new();
        loop {
            match self.advance() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    return Err(self.error("Unterminated string literal", span));
                }
                Some(b'"') => {
                    return Ok(Token::new(
                        TokenKind::Str(buf),
                        self.span_from(start_line, start_col),
                    ));
                }
                Some(b'\\') => match self.advance() {
                    Some(b'n') => buf.push('\n'),
                    Some(b't') => buf.push('\t'),
                    Some(b'"') => buf.push('"'),
                    Some(b'\\') => buf.push('\\'),
                    Some(other) => {
                        // Unknown escapes keep the character as written.
                        buf.push(other as char);
                    }
                    None => {
                        let span = self.span_from(start_line, start_col);
                        return Err(self.error("Unterminated string literal", span));
                    }
                },
                Some(ch) => buf.push(ch as char),
            }
        }
    }
}
