//! ThinkLang tree-walking evaluator.
//!
//! Executes programs directly from the AST: no bytecode, no static
//! checking. The crate also owns the runtime value model, the scope
//! chain, the built-in function registry, the module loader, and the
//! `run` entry boundary shared by file and interactive execution.

mod builtins;
mod error;
mod evaluator;
mod generate;
mod scope;
mod value;

pub use builtins::{Builtin, BUILTINS};
pub use error::{Flow, Unwind};
pub use evaluator::Interpreter;
pub use generate::CodeGenerator;
pub use scope::{Context, SymbolTable, SymbolTableRef};
pub use value::{FileHandle, Function, Value};
