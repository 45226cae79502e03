//! ThinkLang lexer: converts source text into a token stream.

pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind, KEYWORDS};
