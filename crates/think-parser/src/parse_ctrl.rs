//! Control-flow constructs: if/elif/else chains, loops, function
//! definitions, `think`, and `import`.
//!
//! Every construct has two body forms. A single-line body (`then expr`,
//! `-> expr`) is an expression whose value flows out. A block body
//! (`then` NEWLINE ... `end`) sets the suppress-value flag so the
//! accumulated statement list collapses to Null in expression position.

use crate::parser::Parser;
use think_lexer::token::TokenKind;
use think_types::ast::{ElseCase, IfCase, Node, NodeKind};
use think_types::Result;
use std::rc::Rc;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════
    // If / elif / else
    // ══════════════════════════════════════════════════════════════════════

    /// `if cond then body { elif cond then body } [ else body ] [ end ]`
    pub(crate) fn parse_if_expr(&mut self) -> Result<Node> {
        let start = self.current_span();
        self.expect(&TokenKind::If)?;

        let mut cases = Vec::new();
        let mut else_case = None;

        loop {
            let condition = self.parse_expression()?;
            self.expect(&TokenKind::Then)?;

            if self.eat(&TokenKind::Newline) {
                // Block branch: runs to `elif`, `else`, or `end`.
                let body = self.parse_statements(&[
                    TokenKind::Elif,
                    TokenKind::Else,
                    TokenKind::End,
                ])?;
                cases.push(IfCase {
                    condition,
                    body,
                    suppress_value: true,
                });
                match self.peek_kind() {
                    TokenKind::Elif => {
                        self.advance();
                        continue;
                    }
                    TokenKind::Else => {
                        self.advance();
                        else_case = Some(Box::new(self.parse_else_body()?));
                        break;
                    }
                    TokenKind::End => {
                        self.advance();
                        break;
                    }
                    other => {
                        return Err(self.error_at_current(format!(
                            "Expected 'elif', 'else' or 'end', got '{other}'"
                        )));
                    }
                }
            } else {
                // Single-line branch.
                let body = self.parse_statement()?;
                cases.push(IfCase {
                    condition,
                    body,
                    suppress_value: false,
                });
                if self.eat(&TokenKind::Elif) {
                    continue;
                }
                if self.eat(&TokenKind::Else) {
                    else_case = Some(Box::new(self.parse_else_body()?));
                }
                break;
            }
        }

        let span = start.to(self.previous_span());
        Ok(Node::new(NodeKind::If { cases, else_case }, span))
    }

    /// The body after `else`: block form consumes its own `end`.
    fn parse_else_body(&mut self) -> Result<ElseCase> {
        if self.eat(&TokenKind::Newline) {
            let body = self.parse_statements(&[TokenKind::End])?;
            self.expect(&TokenKind::End)?;
            Ok(ElseCase {
                body,
                suppress_value: true,
            })
        } else {
            let body = self.parse_statement()?;
            Ok(ElseCase {
                body,
                suppress_value: false,
            })
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Loops
    // ══════════════════════════════════════════════════════════════════════

    /// `for name = start to end [ step expr ] then body [ end ]`
    pub(crate) fn parse_for_expr(&mut self) -> Result<Node> {
        let start_span = self.current_span();
        self.expect(&TokenKind::For)?;
        let (var, _) = self.expect_identifier()?;
        self.expect(&TokenKind::Eq)?;
        let start = self.parse_expression()?;
        self.expect(&TokenKind::To)?;
        let end = self.parse_expression()?;
        let step = if self.eat(&TokenKind::Step) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        self.expect(&TokenKind::Then)?;

        let (body, suppress_value) = self.parse_loop_body()?;
        let span = start_span.to(self.previous_span());
        Ok(Node::new(
            NodeKind::For {
                var,
                start: Box::new(start),
                end: Box::new(end),
                step,
                body: Box::new(body),
                suppress_value,
            },
            span,
        ))
    }

    /// `while cond then body [ end ]`
    pub(crate) fn parse_while_expr(&mut self) -> Result<Node> {
        let start = self.current_span();
        self.expect(&TokenKind::While)?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::Then)?;

        let (body, suppress_value) = self.parse_loop_body()?;
        let span = start.to(self.previous_span());
        Ok(Node::new(
            NodeKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
                suppress_value,
            },
            span,
        ))
    }

    /// Shared loop-body parsing after `then`.
    fn parse_loop_body(&mut self) -> Result<(Node, bool)> {
        if self.eat(&TokenKind::Newline) {
            let body = self.parse_statements(&[TokenKind::End])?;
            self.expect(&TokenKind::End)?;
            Ok((body, true))
        } else {
            Ok((self.parse_statement()?, false))
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Function definitions
    // ══════════════════════════════════════════════════════════════════════

    /// `func [name] ( params ) -> expr`
    /// `func [name] ( params ) NEWLINE body end`
    pub(crate) fn parse_func_def(&mut self) -> Result<Node> {
        let start = self.current_span();
        self.expect(&TokenKind::Func)?;

        let name = if matches!(self.peek_kind(), TokenKind::Identifier(_)) {
            Some(self.expect_identifier()?.0)
        } else {
            None
        };

        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.expect_identifier()?.0);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;

        let (body, auto_return) = if self.eat(&TokenKind::Arrow) {
            (self.parse_expression()?, true)
        } else {
            self.expect(&TokenKind::Newline)?;
            let body = self.parse_statements(&[TokenKind::End])?;
            self.expect(&TokenKind::End)?;
            (body, false)
        };

        let span = start.to(self.previous_span());
        Ok(Node::new(
            NodeKind::FuncDef {
                name,
                params,
                body: Rc::new(body),
                auto_return,
            },
            span,
        ))
    }

    // ══════════════════════════════════════════════════════════════════════
    // Think & import
    // ══════════════════════════════════════════════════════════════════════

    /// `think expr` — the operand becomes the generation prompt.
    pub(crate) fn parse_think_expr(&mut self) -> Result<Node> {
        let start = self.current_span();
        self.expect(&TokenKind::Think)?;
        let prompt = self.parse_expression()?;
        let span = start.to(prompt.span);
        Ok(Node::new(NodeKind::Think(Box::new(prompt)), span))
    }

    /// `import "path"`
    pub(crate) fn parse_import_expr(&mut self) -> Result<Node> {
        let start = self.current_span();
        self.expect(&TokenKind::Import)?;
        let (path, path_span) = self.expect_string()?;
        Ok(Node::new(NodeKind::Import(path), start.to(path_span)))
    }
}
