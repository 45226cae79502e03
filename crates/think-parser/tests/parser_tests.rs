//! Integration tests for the ThinkLang parser.
//!
//! Each test lexes + parses a snippet and asserts on the AST shape:
//! precedence nesting, statement/expression disambiguation, block
//! suppress-value flags, and fail-fast syntax errors.

use think_lexer::Lexer;
use think_parser::Parser;
use think_types::ast::{BinOp, Node, NodeKind, UnaryOp};
use think_types::{ErrorKind, SourceFile, ThinkError};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Parse source into the program root (panics on errors).
fn parse(source: &str) -> Node {
    let sf = SourceFile::new("test.think", source);
    let tokens = Lexer::new(&sf).lex().expect("lex failed");
    Parser::new(tokens, &sf).parse().expect("parse failed")
}

fn parse_err(source: &str) -> ThinkError {
    let sf = SourceFile::new("test.think", source);
    let tokens = Lexer::new(&sf).lex().expect("lex failed");
    Parser::new(tokens, &sf)
        .parse()
        .expect_err("expected a syntax error")
}

/// The program root is an implicit List; unwrap its statements.
fn statements(root: Node) -> Vec<Node> {
    match root.kind {
        NodeKind::List(stmts) => stmts,
        other => panic!("program root should be a List, got {other:?}"),
    }
}

/// Parse a single-statement program and return that statement.
fn stmt(source: &str) -> Node {
    let mut stmts = statements(parse(source));
    assert_eq!(stmts.len(), 1, "expected exactly one statement");
    stmts.remove(0)
}

/// Assert a node is a binary op and return (left, op, right).
fn as_binary(node: Node) -> (Node, BinOp, Node) {
    match node.kind {
        NodeKind::Binary { left, op, right } => (*left, op, *right),
        other => panic!("expected binary node, got {other:?}"),
    }
}

fn number(node: &Node) -> f64 {
    match node.kind {
        NodeKind::Number(n) => n,
        ref other => panic!("expected number node, got {other:?}"),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Precedence
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn multiplication_binds_tighter_than_addition() {
    // 1 + 2 * 3 → (1 + (2 * 3))
    let (left, op, right) = as_binary(stmt("1 + 2 * 3"));
    assert_eq!(op, BinOp::Add);
    assert_eq!(number(&left), 1.0);
    let (l2, op2, r2) = as_binary(right);
    assert_eq!(op2, BinOp::Mul);
    assert_eq!(number(&l2), 2.0);
    assert_eq!(number(&r2), 3.0);
}

#[test]
fn power_is_right_associative() {
    // 2 ^ 3 ^ 2 → 2 ^ (3 ^ 2)
    let (left, op, right) = as_binary(stmt("2 ^ 3 ^ 2"));
    assert_eq!(op, BinOp::Pow);
    assert_eq!(number(&left), 2.0);
    let (l2, op2, r2) = as_binary(right);
    assert_eq!(op2, BinOp::Pow);
    assert_eq!(number(&l2), 3.0);
    assert_eq!(number(&r2), 2.0);
}

#[test]
fn comparison_binds_looser_than_arithmetic() {
    // 1 + 1 == 2 → ((1 + 1) == 2)
    let (left, op, _) = as_binary(stmt("1 + 1 == 2"));
    assert_eq!(op, BinOp::Eq);
    let (_, op2, _) = as_binary(left);
    assert_eq!(op2, BinOp::Add);
}

#[test]
fn logic_binds_loosest() {
    // a == 1 and b == 2 → ((a == 1) and (b == 2))
    let (left, op, right) = as_binary(stmt("a == 1 and b == 2"));
    assert_eq!(op, BinOp::And);
    assert_eq!(as_binary(left).1, BinOp::Eq);
    assert_eq!(as_binary(right).1, BinOp::Eq);
}

#[test]
fn parentheses_override_precedence() {
    // (1 + 2) * 3 → ((1 + 2) * 3)
    let (left, op, _) = as_binary(stmt("(1 + 2) * 3"));
    assert_eq!(op, BinOp::Mul);
    assert_eq!(as_binary(left).1, BinOp::Add);
}

#[test]
fn unary_minus_nests() {
    match stmt("--1").kind {
        NodeKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => {
            assert!(matches!(
                operand.kind,
                NodeKind::Unary {
                    op: UnaryOp::Neg,
                    ..
                }
            ));
        }
        other => panic!("expected nested negation, got {other:?}"),
    }
}

#[test]
fn not_applies_to_comparisons() {
    // not a == b → not (a == b)
    match stmt("not a == b").kind {
        NodeKind::Unary {
            op: UnaryOp::Not,
            operand,
        } => {
            assert_eq!(as_binary(*operand).1, BinOp::Eq);
        }
        other => panic!("expected not node, got {other:?}"),
    }
}

#[test]
fn dot_is_postfix() {
    // xs . 0 . 1 → ((xs . 0) . 1)
    let (left, op, _) = as_binary(stmt("xs . 0 . 1"));
    assert_eq!(op, BinOp::Dot);
    assert_eq!(as_binary(left).1, BinOp::Dot);
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn assignment_statement() {
    match stmt("x = 5").kind {
        NodeKind::VarAssign { name, value } => {
            assert_eq!(name, "x");
            assert_eq!(number(&value), 5.0);
        }
        other => panic!("expected assignment, got {other:?}"),
    }
}

#[test]
fn chained_assignment_nests_right() {
    match stmt("a = b = 1").kind {
        NodeKind::VarAssign { name, value } => {
            assert_eq!(name, "a");
            assert!(matches!(value.kind, NodeKind::VarAssign { .. }));
        }
        other => panic!("expected assignment, got {other:?}"),
    }
}

#[test]
fn equality_is_not_assignment() {
    assert!(matches!(
        stmt("x == 5").kind,
        NodeKind::Binary { op: BinOp::Eq, .. }
    ));
}

#[test]
fn statements_split_on_newlines_and_semicolons() {
    let stmts = statements(parse("a = 1\nb = 2; c = 3"));
    assert_eq!(stmts.len(), 3);
}

#[test]
fn return_with_and_without_operand() {
    let stmts = statements(parse("return 1\nreturn"));
    assert!(matches!(&stmts[0].kind, NodeKind::Return(Some(_))));
    assert!(matches!(&stmts[1].kind, NodeKind::Return(None)));
}

#[test]
fn continue_and_break() {
    let stmts = statements(parse("continue\nbreak"));
    assert!(matches!(stmts[0].kind, NodeKind::Continue));
    assert!(matches!(stmts[1].kind, NodeKind::Break));
}

#[test]
fn empty_program_is_an_empty_list() {
    assert!(statements(parse("")).is_empty());
    assert!(statements(parse("\n\n\n")).is_empty());
}

// ══════════════════════════════════════════════════════════════════════════════
// Control flow
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn single_line_if_keeps_branch_value() {
    match stmt("if x then 1 elif y then 2 else 3").kind {
        NodeKind::If { cases, else_case } => {
            assert_eq!(cases.len(), 2);
            assert!(!cases[0].suppress_value);
            assert!(!cases[1].suppress_value);
            assert!(!else_case.unwrap().suppress_value);
        }
        other => panic!("expected if node, got {other:?}"),
    }
}

#[test]
fn block_if_suppresses_branch_value() {
    let source = "if x then\n  a = 1\n  a\nelse\n  2\nend";
    match stmt(source).kind {
        NodeKind::If { cases, else_case } => {
            assert_eq!(cases.len(), 1);
            assert!(cases[0].suppress_value);
            assert!(else_case.unwrap().suppress_value);
        }
        other => panic!("expected if node, got {other:?}"),
    }
}

#[test]
fn block_if_requires_end() {
    let err = parse_err("if x then\n  1\n");
    assert_eq!(err.kind, ErrorKind::Syntax);
}

#[test]
fn for_with_default_step() {
    match stmt("for i = 0 to 5 then i").kind {
        NodeKind::For {
            var,
            step,
            suppress_value,
            ..
        } => {
            assert_eq!(var, "i");
            assert!(step.is_none());
            assert!(!suppress_value);
        }
        other => panic!("expected for node, got {other:?}"),
    }
}

#[test]
fn for_with_step_and_block_body() {
    match stmt("for i = 10 to 0 step -2 then\n  i\nend").kind {
        NodeKind::For {
            step,
            suppress_value,
            ..
        } => {
            assert!(step.is_some());
            assert!(suppress_value);
        }
        other => panic!("expected for node, got {other:?}"),
    }
}

#[test]
fn while_block_body() {
    match stmt("while x > 0 then\n  x = x - 1\nend").kind {
        NodeKind::While { suppress_value, .. } => assert!(suppress_value),
        other => panic!("expected while node, got {other:?}"),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions & calls
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn arrow_function_auto_returns() {
    match stmt("func sq(x) -> x * x").kind {
        NodeKind::FuncDef {
            name,
            params,
            auto_return,
            ..
        } => {
            assert_eq!(name.as_deref(), Some("sq"));
            assert_eq!(params, vec!["x".to_string()]);
            assert!(auto_return);
        }
        other => panic!("expected func def, got {other:?}"),
    }
}

#[test]
fn block_function_does_not_auto_return() {
    match stmt("func f(a, b)\n  a + b\nend").kind {
        NodeKind::FuncDef {
            params,
            auto_return,
            ..
        } => {
            assert_eq!(params.len(), 2);
            assert!(!auto_return);
        }
        other => panic!("expected func def, got {other:?}"),
    }
}

#[test]
fn anonymous_function() {
    match stmt("func (x) -> x").kind {
        NodeKind::FuncDef { name, .. } => assert!(name.is_none()),
        other => panic!("expected func def, got {other:?}"),
    }
}

#[test]
fn call_with_arguments() {
    match stmt("f(1, 2, 3)").kind {
        NodeKind::Call { callee, args } => {
            assert!(matches!(callee.kind, NodeKind::VarAccess(ref n) if n == "f"));
            assert_eq!(args.len(), 3);
        }
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn curried_call_chain() {
    // f(1)(2) → Call(Call(f, [1]), [2])
    match stmt("f(1)(2)").kind {
        NodeKind::Call { callee, .. } => {
            assert!(matches!(callee.kind, NodeKind::Call { .. }));
        }
        other => panic!("expected call, got {other:?}"),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Atoms
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn list_literal() {
    match stmt("[1, \"two\", [3]]").kind {
        NodeKind::List(elements) => assert_eq!(elements.len(), 3),
        other => panic!("expected list literal, got {other:?}"),
    }
}

#[test]
fn import_takes_a_string_literal() {
    match stmt("import \"util.think\"").kind {
        NodeKind::Import(path) => assert_eq!(path, "util.think"),
        other => panic!("expected import, got {other:?}"),
    }
}

#[test]
fn import_rejects_non_string() {
    let err = parse_err("import util");
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert!(err.message.contains("string literal"));
}

#[test]
fn think_wraps_its_prompt() {
    match stmt("think \"make a counter\"").kind {
        NodeKind::Think(prompt) => {
            assert!(matches!(prompt.kind, NodeKind::Str(_)));
        }
        other => panic!("expected think node, got {other:?}"),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn unexpected_token_fails_fast_with_position() {
    let err = parse_err("1 +");
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert_eq!(err.span.start_line, 1);
    assert_eq!(err.span.start_col, 4);
}

#[test]
fn error_names_the_expected_tokens() {
    let err = parse_err("for i 0 to 5 then i");
    assert!(err.message.contains("Expected '='"), "{}", err.message);
}

#[test]
fn unclosed_paren_is_a_syntax_error() {
    assert_eq!(parse_err("(1 + 2").kind, ErrorKind::Syntax);
}

#[test]
fn node_spans_cover_their_tokens() {
    let node = stmt("1 + 2 * 3");
    assert_eq!(node.span.start_col, 1);
    assert_eq!(node.span.end_col, 9);
}
