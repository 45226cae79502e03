//! ThinkLang parser: converts a token stream into an AST.

mod parse_ctrl;
mod parse_expr;
mod parser;

pub use parser::Parser;
