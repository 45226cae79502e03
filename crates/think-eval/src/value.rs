//! The runtime value model.
//!
//! A closed tagged union: every computable result is one of these
//! variants, and every operation a value supports is an exhaustive
//! match here. Lists are shared by reference, so mutating built-ins
//! (`append`, `pop`, `extend`) are visible through every binding.

use crate::builtins::Builtin;
use crate::scope::SymbolTableRef;
use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use think_types::ast::{BinOp, Node, UnaryOp};
use think_types::SourceFile;

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    /// One unified numeric kind. Whole numbers print without a decimal.
    Number(f64),
    Str(String),
    /// Ordered, mutable, shared by reference.
    List(Rc<RefCell<Vec<Value>>>),
    /// A user-defined function plus the scope it closed over.
    Function(Rc<Function>),
    /// A native operation from the registry.
    Builtin(&'static Builtin),
    /// A handle produced by `open_file`.
    File(Rc<FileHandle>),
    Null,
}

/// A user-defined function value.
pub struct Function {
    /// `None` for anonymous functions.
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<Node>,
    /// Arrow-bodied functions return their expression's value.
    pub auto_return: bool,
    /// The defining scope, captured by reference.
    pub closure: SymbolTableRef,
    /// The source the body's spans point into.
    pub source: Rc<SourceFile>,
}

impl Function {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

// The closure table can (and usually does) contain the function itself,
// so a derived Debug would recurse. Print the signature only.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("auto_return", &self.auto_return)
            .finish_non_exhaustive()
    }
}

/// A logical file handle: a display name plus the underlying path.
#[derive(Debug, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    pub path: PathBuf,
}

impl Value {
    // ── Constructors ─────────────────────────────────────────────────────

    pub fn string(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    pub fn list(elements: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(elements)))
    }

    /// The language's boolean encoding: Number 1 or 0.
    pub fn bool(b: bool) -> Value {
        Value::Number(if b { 1.0 } else { 0.0 })
    }

    // ── Classification ───────────────────────────────────────────────────

    /// The type tag reported by `type_of`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 {
                    "<int>"
                } else {
                    "<float>"
                }
            }
            Value::Str(_) => "<str>",
            Value::List(_) => "<list>",
            Value::Function(_) | Value::Builtin(_) => "<function>",
            Value::File(_) => "<file>",
            Value::Null => "<null>",
        }
    }

    /// Truthiness: zero, the empty string, the empty list, and null are
    /// falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Function(_) | Value::Builtin(_) | Value::File(_) => true,
            Value::Null => false,
        }
    }

    /// Like `Display`, but strings keep their quotes. Used by `print`
    /// for non-string values and for list elements.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("\"{s}\""),
            other => other.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Equality
// ─────────────────────────────────────────────────────────────────────

impl PartialEq for Value {
    /// Structural equality within a kind; values of different kinds are
    /// never equal. Functions compare by identity, NaN never equals NaN.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::File(a), Value::File(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Display
// ─────────────────────────────────────────────────────────────────────

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                let parts: Vec<String> = items.borrow().iter().map(Value::repr).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Function(func) => write!(f, "<function {}>", func.display_name()),
            Value::Builtin(b) => write!(f, "<built-in function {}>", b.name),
            Value::File(h) => write!(f, "<file {}>", h.name),
            Value::Null => write!(f, "null"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Operation contracts
// ─────────────────────────────────────────────────────────────────────

/// Apply a binary operator to two values.
///
/// Returns the bare error message on failure; the evaluator attaches
/// the span and context chain.
pub fn binary_op(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, String> {
    use Value::{List, Number, Str};
    match (op, lhs, rhs) {
        // ── Arithmetic ──
        (BinOp::Add, Number(a), Number(b)) => Ok(Number(a + b)),
        (BinOp::Add, Str(a), Str(b)) => Ok(Value::string(format!("{a}{b}"))),
        // `list + x` yields a new list; `append` is the in-place form.
        (BinOp::Add, List(items), other) => {
            let mut out = items.borrow().clone();
            out.push(other.clone());
            Ok(Value::list(out))
        }
        (BinOp::Sub, Number(a), Number(b)) => Ok(Number(a - b)),
        (BinOp::Sub, List(items), Number(index)) => {
            let mut out = items.borrow().clone();
            let idx = resolve_index(*index, out.len())?;
            out.remove(idx);
            Ok(Value::list(out))
        }
        (BinOp::Mul, Number(a), Number(b)) => Ok(Number(a * b)),
        (BinOp::Mul, Str(s), Number(count)) => {
            let count = count.max(0.0).trunc() as usize;
            Ok(Value::string(s.repeat(count)))
        }
        (BinOp::Mul, List(a), List(b)) => {
            let mut out = a.borrow().clone();
            out.extend(b.borrow().iter().cloned());
            Ok(Value::list(out))
        }
        (BinOp::Div, Number(a), Number(b)) => {
            if *b == 0.0 {
                Err("Division by zero".to_string())
            } else {
                Ok(Number(a / b))
            }
        }
        (BinOp::Mod, Number(a), Number(b)) => {
            if *b == 0.0 {
                Err("Modulo by zero".to_string())
            } else {
                Ok(Number(a % b))
            }
        }
        (BinOp::Pow, Number(a), Number(b)) => Ok(Number(a.powf(*b))),

        // ── Member access ──
        (BinOp::Dot, List(items), Number(index)) => {
            let items = items.borrow();
            let idx = resolve_index(*index, items.len())?;
            Ok(items[idx].clone())
        }
        (BinOp::Dot, Str(s), Number(index)) => {
            let chars: Vec<char> = s.chars().collect();
            let idx = resolve_index(*index, chars.len())?;
            Ok(Value::string(chars[idx].to_string()))
        }

        // ── Equality (any kinds) ──
        (BinOp::Eq, a, b) => Ok(Value::bool(a == b)),
        (BinOp::NotEq, a, b) => Ok(Value::bool(a != b)),

        // ── Ordering (numbers only) ──
        (BinOp::Less, Number(a), Number(b)) => Ok(Value::bool(a < b)),
        (BinOp::Greater, Number(a), Number(b)) => Ok(Value::bool(a > b)),
        (BinOp::LessEq, Number(a), Number(b)) => Ok(Value::bool(a <= b)),
        (BinOp::GreaterEq, Number(a), Number(b)) => Ok(Value::bool(a >= b)),

        // ── Logic (eager, any kinds) ──
        (BinOp::And, a, b) => Ok(Value::bool(a.is_truthy() && b.is_truthy())),
        (BinOp::Or, a, b) => Ok(Value::bool(a.is_truthy() || b.is_truthy())),

        (op, a, b) => Err(format!(
            "Illegal operation: {} {} {}",
            a.type_name(),
            op.as_str(),
            b.type_name()
        )),
    }
}

/// Apply a unary operator to a value.
pub fn unary_op(op: UnaryOp, value: &Value) -> Result<Value, String> {
    match (op, value) {
        (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnaryOp::Not, v) => Ok(Value::bool(!v.is_truthy())),
        (op, v) => Err(format!(
            "Illegal operation: {} {}",
            op.as_str(),
            v.type_name()
        )),
    }
}

/// Resolve a possibly-negative index against a sequence length.
/// Negative indices count from the end.
pub(crate) fn resolve_index(index: f64, len: usize) -> Result<usize, String> {
    let raw = index.trunc() as i64;
    let resolved = if raw < 0 { raw + len as i64 } else { raw };
    if resolved < 0 || resolved as usize >= len {
        Err(format!("Index {raw} is out of bounds"))
    } else {
        Ok(resolved as usize)
    }
}
