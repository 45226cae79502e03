//! Expression parsing with explicit operator-precedence levels.
//!
//! Precedence (lowest → highest):
//! 7. `or`, `and`
//! 6. `==`, `!=`, `<`, `>`, `<=`, `>=` (with prefix `not` at this level)
//! 5. `+`, `-`
//! 4. `*`, `/`, `%`
//! 3. unary `-`
//! 2. `^` (right-associative: the right operand re-enters at level 3)
//! 1. postfix `(args)` call and `.` member access
//! 0. atoms: literals, identifiers, `( )`, `[ ]`, and the control-flow
//!    constructs usable in expression position

use crate::parser::Parser;
use think_lexer::token::TokenKind;
use think_types::ast::{BinOp, Node, NodeKind, UnaryOp};
use think_types::Result;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════
    // Entry point
    // ══════════════════════════════════════════════════════════════════════

    /// Parse an expression.
    ///
    /// Assignment (`name = expr`) lives here rather than in the binary
    /// chain: an identifier directly followed by `=` re-binds that name,
    /// and the right-hand side is a full expression, so `a = b = 1`
    /// assigns right to left.
    pub(crate) fn parse_expression(&mut self) -> Result<Node> {
        if let TokenKind::Identifier(name) = self.peek_kind() {
            if self.look_ahead(1) == &TokenKind::Eq {
                let name = name.clone();
                let start = self.advance().span; // identifier
                self.advance(); // `=`
                let value = self.parse_expression()?;
                let span = start.to(value.span);
                return Ok(Node::new(
                    NodeKind::VarAssign {
                        name,
                        value: Box::new(value),
                    },
                    span,
                ));
            }
        }
        self.parse_logic()
    }

    // ══════════════════════════════════════════════════════════════════════
    // Precedence chain
    // ══════════════════════════════════════════════════════════════════════

    /// `LogicExpr = CompExpr { ("and" | "or") CompExpr }`
    fn parse_logic(&mut self) -> Result<Node> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::And => BinOp::And,
                TokenKind::Or => BinOp::Or,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    /// `CompExpr = "not" CompExpr | AddExpr { CompOp AddExpr }`
    fn parse_comparison(&mut self) -> Result<Node> {
        if self.check(&TokenKind::Not) {
            let start = self.advance().span;
            let operand = self.parse_comparison()?;
            let span = start.to(operand.span);
            return Ok(Node::new(
                NodeKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ));
        }

        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::BangEq => BinOp::NotEq,
                TokenKind::Less => BinOp::Less,
                TokenKind::Greater => BinOp::Greater,
                TokenKind::LessEq => BinOp::LessEq,
                TokenKind::GreaterEq => BinOp::GreaterEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    /// `AddExpr = MulExpr { ("+" | "-") MulExpr }`
    fn parse_additive(&mut self) -> Result<Node> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    /// `MulExpr = UnaryExpr { ("*" | "/" | "%") UnaryExpr }`
    fn parse_multiplicative(&mut self) -> Result<Node> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    /// `UnaryExpr = "-" UnaryExpr | PowExpr`
    pub(crate) fn parse_unary(&mut self) -> Result<Node> {
        if self.check(&TokenKind::Minus) {
            let start = self.advance().span;
            let operand = self.parse_unary()?;
            let span = start.to(operand.span);
            return Ok(Node::new(
                NodeKind::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_power()
    }

    /// `PowExpr = PostfixExpr [ "^" UnaryExpr ]`
    ///
    /// The right operand re-enters at the unary level, which makes `^`
    /// right-associative (`2 ^ 3 ^ 2` is `2 ^ (3 ^ 2)`) and allows a
    /// negated exponent (`2 ^ -3`).
    fn parse_power(&mut self) -> Result<Node> {
        let left = self.parse_postfix()?;
        if self.eat(&TokenKind::Caret) {
            let right = self.parse_unary()?;
            return Ok(binary(left, BinOp::Pow, right));
        }
        Ok(left)
    }

    /// `PostfixExpr = Atom { "(" ArgList ")" | "." Atom }`
    fn parse_postfix(&mut self) -> Result<Node> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_arg_list()?;
                    self.expect(&TokenKind::RParen)?;
                    let span = expr.span.to(self.previous_span());
                    expr = Node::new(
                        NodeKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let member = self.parse_atom()?;
                    let span = expr.span.to(member.span);
                    expr = Node::new(
                        NodeKind::Binary {
                            left: Box::new(expr),
                            op: BinOp::Dot,
                            right: Box::new(member),
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Comma-separated argument expressions, up to (not including) `)`.
    fn parse_arg_list(&mut self) -> Result<Vec<Node>> {
        let mut args = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(args)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Atoms
    // ══════════════════════════════════════════════════════════════════════

    fn parse_atom(&mut self) -> Result<Node> {
        let start = self.current_span();
        match self.peek_kind().clone() {
            TokenKind::Number(value) => {
                let span = self.advance().span;
                Ok(Node::new(NodeKind::Number(value), span))
            }
            TokenKind::Str(value) => {
                let span = self.advance().span;
                Ok(Node::new(NodeKind::Str(value), span))
            }
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Ok(Node::new(NodeKind::VarAccess(name), span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                // The grouped node keeps the parenthesized extent.
                Ok(Node::new(inner.kind, start.to(self.previous_span())))
            }
            TokenKind::LBracket => self.parse_list_literal(),
            TokenKind::If => self.parse_if_expr(),
            TokenKind::For => self.parse_for_expr(),
            TokenKind::While => self.parse_while_expr(),
            TokenKind::Func => self.parse_func_def(),
            TokenKind::Think => self.parse_think_expr(),
            TokenKind::Import => self.parse_import_expr(),
            other => Err(self.error_at_current(format!(
                "Expected number, string, identifier, '(', '[', 'if', 'for', \
                 'while', 'func', 'think' or 'import', got '{other}'"
            ))),
        }
    }

    /// `[ expr, expr, ... ]`
    fn parse_list_literal(&mut self) -> Result<Node> {
        let start = self.current_span();
        self.expect(&TokenKind::LBracket)?;
        let mut elements = Vec::new();
        if !self.check(&TokenKind::RBracket) {
            loop {
                elements.push(self.parse_expression()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(Node::new(
            NodeKind::List(elements),
            start.to(self.previous_span()),
        ))
    }
}

/// Combine two nodes with a binary operator, covering both spans.
fn binary(left: Node, op: BinOp, right: Node) -> Node {
    let span = left.span.to(right.span);
    Node::new(
        NodeKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}
