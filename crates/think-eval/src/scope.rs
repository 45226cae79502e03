//! Lexical scope chain and call/import contexts.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use think_types::{SourceFile, Span};

/// Shared handle to a symbol table.
///
/// Tables are shared by reference: a closure keeps its defining table
/// alive, and mutations made through any handle are visible to all.
pub type SymbolTableRef = Rc<RefCell<SymbolTable>>;

/// A chained name → value mapping.
///
/// Lookup walks the chain outward and returns the first match.
/// Assignment always writes into the local table, shadowing any
/// ancestor binding of the same name instead of mutating it.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Value>,
    parent: Option<SymbolTableRef>,
}

impl SymbolTable {
    pub fn new() -> SymbolTableRef {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn with_parent(parent: SymbolTableRef) -> SymbolTableRef {
        Rc::new(RefCell::new(Self {
            symbols: HashMap::new(),
            parent: Some(parent),
        }))
    }

    /// Look up a name in this table, then in each ancestor.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.symbols.get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.borrow().get(name))
    }

    /// Bind a name in this table only.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.symbols.insert(name.into(), value);
    }

    /// Remove a local binding. Ancestors are never touched.
    pub fn remove(&mut self, name: &str) {
        self.symbols.remove(name);
    }
}

/// One frame of the call/import stack.
///
/// A context is created per function call and per module load, and
/// discarded when that call or load returns. It carries the active
/// symbol table, a private table for per-invocation metadata (the
/// `is_main` flag), and enough position data to build a traceback.
#[derive(Debug)]
pub struct Context {
    /// Display name for diagnostics: `<stdin>`, `<module>`, `fib`, ...
    pub name: String,
    /// The active scope.
    pub table: SymbolTableRef,
    /// Per-invocation metadata, consulted after the scope chain misses.
    pub private: SymbolTableRef,
    /// The frame this one was entered from, if any.
    pub parent: Option<Rc<Context>>,
    /// Where in the parent this context was entered (call/import site).
    pub entry_span: Span,
    /// The source text this context's nodes point into.
    pub source: Rc<SourceFile>,
}

impl Context {
    /// Create a top-of-stack context (a `run` invocation).
    pub fn root(
        name: impl Into<String>,
        table: SymbolTableRef,
        private: SymbolTableRef,
        source: Rc<SourceFile>,
    ) -> Rc<Context> {
        Rc::new(Context {
            name: name.into(),
            table,
            private,
            parent: None,
            entry_span: Span::point(1, 1),
            source,
        })
    }

    /// Create a child frame entered at `entry_span` in `parent`.
    pub fn child(
        parent: &Rc<Context>,
        name: impl Into<String>,
        table: SymbolTableRef,
        private: SymbolTableRef,
        entry_span: Span,
        source: Rc<SourceFile>,
    ) -> Rc<Context> {
        Rc::new(Context {
            name: name.into(),
            table,
            private,
            parent: Some(Rc::clone(parent)),
            entry_span,
            source,
        })
    }
}
