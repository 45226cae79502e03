//! The tree-walking interpreter.
//!
//! Dispatches on node kind against a [`Context`], producing either a
//! value or an unwinding signal. Also owns the process-wide pieces:
//! the global symbol table, the standard-library root for imports, the
//! code-generation hook, and the interrupt flag.

use crate::builtins;
use crate::error::{Flow, Unwind};
use crate::generate::CodeGenerator;
use crate::scope::{Context, SymbolTable, SymbolTableRef};
use crate::value::{self, Function, Value};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use think_lexer::Lexer;
use think_parser::Parser;
use think_types::ast::{ElseCase, IfCase, Node, NodeKind};
use think_types::{ErrorKind, SourceFile, Span, ThinkError};

/// The ThinkLang interpreter.
///
/// One instance holds one global symbol table, shared by every
/// top-level `run` call and every imported module for its lifetime.
/// Independent instances never share state, so embedders (and tests)
/// can run scripts side by side without cross-contamination.
pub struct Interpreter {
    /// The process-wide scope: constants, built-ins, and every
    /// top-level binding made by any program or module.
    globals: SymbolTableRef,
    /// Private table for top-level runs (`is_main = 1`).
    main_private: SymbolTableRef,
    /// Root directory for the second leg of import resolution.
    std_root: PathBuf,
    /// The collaborator behind `think`, if one is installed.
    generator: Option<Box<dyn CodeGenerator>>,
    /// Externally-settable abort flag, checked on every node.
    interrupt: Arc<AtomicBool>,
    /// Runtime RNG for the random built-ins; reseedable via `rand_seed`.
    pub(crate) rng: StdRng,
}

impl Interpreter {
    /// Create an interpreter with a freshly populated global table.
    pub fn new() -> Self {
        let globals = SymbolTable::new();
        {
            let mut g = globals.borrow_mut();
            g.set("null", Value::Null);
            g.set("false", Value::Number(0.0));
            g.set("true", Value::Number(1.0));
            g.set("list", Value::string("<list>"));
            g.set("str", Value::string("<str>"));
            g.set("int", Value::string("<int>"));
            g.set("float", Value::string("<float>"));
            g.set("function", Value::string("<function>"));
            for builtin in builtins::BUILTINS {
                g.set(builtin.name, Value::Builtin(builtin));
            }
            // Historical alias for the script-execution built-in.
            if let Some(run) = builtins::lookup("run") {
                g.set("Run", Value::Builtin(run));
            }
        }

        let main_private = SymbolTable::new();
        main_private
            .borrow_mut()
            .set("is_main", Value::Number(1.0));

        Self {
            globals,
            main_private,
            std_root: PathBuf::from("std"),
            generator: None,
            interrupt: Arc::new(AtomicBool::new(false)),
            rng: StdRng::from_entropy(),
        }
    }

    /// Override the standard-library root used by `import`.
    pub fn with_std_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.std_root = root.into();
        self
    }

    /// Install the code generator backing `think`.
    pub fn set_generator(&mut self, generator: Box<dyn CodeGenerator>) {
        self.generator = Some(generator);
    }

    /// Handle for aborting execution from another thread. Setting it to
    /// `true` makes the current `run` unwind with an interrupted error.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// The global symbol table, for embedders that pre-bind values.
    pub fn globals(&self) -> SymbolTableRef {
        Rc::clone(&self.globals)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Entry boundaries
    // ══════════════════════════════════════════════════════════════════════

    /// Lex, parse, and evaluate one program against the global table.
    ///
    /// Used identically for file and interactive execution; repeated
    /// calls on one interpreter share all top-level bindings. The value
    /// is the program's statement-value list.
    pub fn run(&mut self, source_name: &str, text: &str) -> Result<Value, ThinkError> {
        let source = Rc::new(SourceFile::new(source_name, text));
        let tokens = Lexer::new(&source).lex()?;
        let ast = Parser::new(tokens, &source).parse()?;

        self.main_private
            .borrow_mut()
            .set("is_main", Value::Number(1.0));
        let ctx = Context::root(
            source_name,
            Rc::clone(&self.globals),
            Rc::clone(&self.main_private),
            source,
        );

        let result = match self.eval(&ast, &ctx) {
            Ok(value) => Ok(value),
            Err(Unwind::Return(value)) => Ok(value),
            // Stray loop signals at top level are dropped, not errors.
            Err(Unwind::Break) | Err(Unwind::Continue) => Ok(Value::Null),
            Err(Unwind::Error(err)) => Err(*err),
        };

        // An interrupt is consumed once it has surfaced as an error.
        if matches!(&result, Err(e) if e.kind == ErrorKind::Interrupted) {
            self.interrupt.store(false, Ordering::Relaxed);
        }
        result
    }

    /// Resolve and execute a module file, as `import` would.
    pub fn load_module(&mut self, path: &str) -> Result<Value, ThinkError> {
        let source = Rc::new(SourceFile::new("<loader>", ""));
        let ctx = Context::root(
            "<loader>",
            Rc::clone(&self.globals),
            Rc::clone(&self.main_private),
            source,
        );
        let span = Span::point(1, 1);
        let resolved = self.resolve_module(path).ok_or_else(|| {
            ThinkError::bare(
                ErrorKind::Runtime,
                format!("No module named {}", self.std_root.join(path).display()),
                span,
                "<loader>",
            )
        })?;
        match self.import_module(&resolved, &ctx, span) {
            Ok(value) => Ok(value),
            Err(Unwind::Error(err)) => Err(*err),
            Err(_) => Ok(Value::Null),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Node dispatch
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate one node. The node set is closed; every variant is
    /// handled here.
    pub(crate) fn eval(&mut self, node: &Node, ctx: &Rc<Context>) -> Flow<Value> {
        if self.interrupt.load(Ordering::Relaxed) {
            return Err(ThinkError::new(
                ErrorKind::Interrupted,
                "Execution interrupted",
                node.span,
                &ctx.source,
            )
            .into());
        }

        match &node.kind {
            NodeKind::Number(n) => Ok(Value::Number(*n)),
            NodeKind::Str(s) => Ok(Value::string(s.clone())),
            NodeKind::List(elements) => self.eval_list(elements, ctx),

            NodeKind::VarAccess(name) => self.eval_var_access(name, node.span, ctx),
            NodeKind::VarAssign { name, value } => {
                let value = self.eval(value, ctx)?;
                ctx.table.borrow_mut().set(name.clone(), value.clone());
                ctx.private.borrow_mut().set(name.clone(), value.clone());
                Ok(value)
            }

            NodeKind::Binary { left, op, right } => {
                let lhs = self.eval(left, ctx)?;
                let rhs = self.eval(right, ctx)?;
                value::binary_op(*op, &lhs, &rhs)
                    .map_err(|msg| self.error(msg, node.span, ctx))
            }
            NodeKind::Unary { op, operand } => {
                let operand = self.eval(operand, ctx)?;
                value::unary_op(*op, &operand).map_err(|msg| self.error(msg, node.span, ctx))
            }

            NodeKind::If { cases, else_case } => self.eval_if(cases, else_case, ctx),
            NodeKind::For {
                var,
                start,
                end,
                step,
                body,
                suppress_value,
            } => self.eval_for(var, start, end, step.as_deref(), body, *suppress_value, ctx),
            NodeKind::While {
                condition,
                body,
                suppress_value,
            } => self.eval_while(condition, body, *suppress_value, ctx),

            NodeKind::Return(operand) => {
                let value = match operand {
                    Some(expr) => self.eval(expr, ctx)?,
                    None => Value::Null,
                };
                Err(Unwind::Return(value))
            }
            NodeKind::Continue => Err(Unwind::Continue),
            NodeKind::Break => Err(Unwind::Break),

            NodeKind::FuncDef {
                name,
                params,
                body,
                auto_return,
            } => {
                let function = Value::Function(Rc::new(Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::clone(body),
                    auto_return: *auto_return,
                    closure: Rc::clone(&ctx.table),
                    source: Rc::clone(&ctx.source),
                }));
                if let Some(name) = name {
                    ctx.table.borrow_mut().set(name.clone(), function.clone());
                }
                Ok(function)
            }
            NodeKind::Call { callee, args } => self.eval_call(callee, args, node.span, ctx),

            NodeKind::Import(path) => self.eval_import(path, node.span, ctx),
            NodeKind::Think(prompt) => self.eval_think(prompt, node.span, ctx),
        }
    }

    // ── Simple nodes ─────────────────────────────────────────────────────

    /// Statement sequences and list literals share one shape: evaluate
    /// the elements in order, propagating any signal immediately.
    fn eval_list(&mut self, elements: &[Node], ctx: &Rc<Context>) -> Flow<Value> {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            values.push(self.eval(element, ctx)?);
        }
        Ok(Value::list(values))
    }

    fn eval_var_access(&mut self, name: &str, span: Span, ctx: &Rc<Context>) -> Flow<Value> {
        let found = {
            let table = ctx.table.borrow();
            table.get(name)
        }
        .or_else(|| ctx.private.borrow().get(name));

        found.ok_or_else(|| self.error(format!("'{name}' is not defined"), span, ctx))
    }

    // ── Control flow ─────────────────────────────────────────────────────

    fn eval_if(
        &mut self,
        cases: &[IfCase],
        else_case: &Option<Box<ElseCase>>,
        ctx: &Rc<Context>,
    ) -> Flow<Value> {
        for case in cases {
            let condition = self.eval(&case.condition, ctx)?;
            if condition.is_truthy() {
                let value = self.eval(&case.body, ctx)?;
                return Ok(if case.suppress_value { Value::Null } else { value });
            }
        }
        if let Some(else_case) = else_case {
            let value = self.eval(&else_case.body, ctx)?;
            return Ok(if else_case.suppress_value {
                Value::Null
            } else {
                value
            });
        }
        Ok(Value::Null)
    }

    #[allow(clippy::too_many_arguments)]
    fn eval_for(
        &mut self,
        var: &str,
        start: &Node,
        end: &Node,
        step: Option<&Node>,
        body: &Node,
        suppress_value: bool,
        ctx: &Rc<Context>,
    ) -> Flow<Value> {
        let start_value = self.eval_loop_bound(start, "start", ctx)?;
        let end_value = self.eval_loop_bound(end, "end", ctx)?;
        let step_value = match step {
            Some(node) => self.eval_loop_bound(node, "step", ctx)?,
            None => 1.0,
        };

        // Half-open range: the end value itself is never reached.
        // Direction follows the sign of the step.
        let ascending = step_value >= 0.0;
        let mut i = start_value;
        let mut elements = Vec::new();

        loop {
            let in_range = if ascending { i < end_value } else { i > end_value };
            if !in_range {
                break;
            }
            ctx.table.borrow_mut().set(var.to_string(), Value::Number(i));
            i += step_value;

            match self.eval(body, ctx) {
                Ok(value) => elements.push(value),
                Err(Unwind::Continue) => continue,
                Err(Unwind::Break) => break,
                Err(other) => return Err(other),
            }
        }

        Ok(if suppress_value {
            Value::Null
        } else {
            Value::list(elements)
        })
    }

    fn eval_loop_bound(&mut self, node: &Node, which: &str, ctx: &Rc<Context>) -> Flow<f64> {
        match self.eval(node, ctx)? {
            Value::Number(n) => Ok(n),
            other => Err(self.error(
                format!("'for' {which} value must be a number, got {}", other.type_name()),
                node.span,
                ctx,
            )),
        }
    }

    fn eval_while(
        &mut self,
        condition: &Node,
        body: &Node,
        suppress_value: bool,
        ctx: &Rc<Context>,
    ) -> Flow<Value> {
        let mut elements = Vec::new();
        loop {
            let cond = self.eval(condition, ctx)?;
            if !cond.is_truthy() {
                break;
            }
            match self.eval(body, ctx) {
                Ok(value) => elements.push(value),
                Err(Unwind::Continue) => continue,
                Err(Unwind::Break) => break,
                Err(other) => return Err(other),
            }
        }
        Ok(if suppress_value {
            Value::Null
        } else {
            Value::list(elements)
        })
    }

    // ── Calls ────────────────────────────────────────────────────────────

    fn eval_call(
        &mut self,
        callee: &Node,
        arg_nodes: &[Node],
        span: Span,
        ctx: &Rc<Context>,
    ) -> Flow<Value> {
        let callee_value = self.eval(callee, ctx)?;

        // Any signal during argument evaluation aborts the call.
        let mut args = Vec::with_capacity(arg_nodes.len());
        for arg in arg_nodes {
            args.push(self.eval(arg, ctx)?);
        }

        match callee_value {
            Value::Function(func) => self.call_function(&func, args, span, ctx),
            Value::Builtin(builtin) => {
                self.check_arity(builtin.name, builtin.params.len(), args.len(), span, ctx)?;
                (builtin.run)(self, &args).map_err(|msg| self.error(msg, span, ctx))
            }
            other => Err(self.error(
                format!("{} is not callable", other.type_name()),
                span,
                ctx,
            )),
        }
    }

    fn call_function(
        &mut self,
        func: &Function,
        args: Vec<Value>,
        span: Span,
        ctx: &Rc<Context>,
    ) -> Flow<Value> {
        self.check_arity(func.display_name(), func.params.len(), args.len(), span, ctx)?;

        let table = SymbolTable::with_parent(Rc::clone(&func.closure));
        {
            let mut table = table.borrow_mut();
            for (param, arg) in func.params.iter().zip(args) {
                table.set(param.clone(), arg);
            }
        }
        let fctx = Context::child(
            ctx,
            func.display_name().to_string(),
            table,
            SymbolTable::new(),
            span,
            Rc::clone(&func.source),
        );

        match self.eval(&func.body, &fctx) {
            // No explicit return: arrow bodies yield their value, block
            // bodies yield Null.
            Ok(value) => Ok(if func.auto_return { value } else { Value::Null }),
            Err(Unwind::Return(value)) => Ok(value),
            Err(other) => Err(other),
        }
    }

    fn check_arity(
        &self,
        name: &str,
        expected: usize,
        got: usize,
        span: Span,
        ctx: &Rc<Context>,
    ) -> Flow<()> {
        if got > expected {
            Err(self.error(
                format!("{} too many arguments passed into '{name}'", got - expected),
                span,
                ctx,
            ))
        } else if got < expected {
            Err(self.error(
                format!("{} too few arguments passed into '{name}'", expected - got),
                span,
                ctx,
            ))
        } else {
            Ok(())
        }
    }

    // ── Modules ──────────────────────────────────────────────────────────

    fn eval_import(&mut self, path: &str, span: Span, ctx: &Rc<Context>) -> Flow<Value> {
        let resolved = self.resolve_module(path).ok_or_else(|| {
            self.error(
                format!("No module named {}", self.std_root.join(path).display()),
                span,
                ctx,
            )
        })?;
        self.import_module(&resolved, ctx, span)
    }

    /// First leg: the literal path. Second leg: under the library root.
    fn resolve_module(&self, path: &str) -> Option<PathBuf> {
        let literal = Path::new(path);
        if literal.is_file() {
            return Some(literal.to_path_buf());
        }
        let fallback = self.std_root.join(path);
        fallback.is_file().then_some(fallback)
    }

    /// Lex, parse, and evaluate a module file.
    ///
    /// The module shares the global symbol table (its top-level bindings
    /// become globally visible) but gets its own context and a private
    /// table marking `is_main = 0`. Errors are re-attributed to the
    /// import site via a traceback frame.
    fn import_module(&mut self, path: &Path, ctx: &Rc<Context>, span: Span) -> Flow<Value> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Err(self.error("File not found", span, ctx)),
        };

        let source = Rc::new(SourceFile::new(path.display().to_string(), text));
        let attribute = |err: ThinkError| {
            Unwind::Error(Box::new(err.with_frame(ctx.name.clone(), span)))
        };
        let tokens = Lexer::new(&source).lex().map_err(attribute)?;
        let ast = Parser::new(tokens, &source).parse().map_err(attribute)?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "module".to_string());
        let private = SymbolTable::new();
        private.borrow_mut().set("is_main", Value::Number(0.0));
        let mctx = Context::child(
            ctx,
            format!("<{stem}>"),
            Rc::clone(&self.globals),
            private,
            span,
            source,
        );

        match self.eval(&ast, &mctx) {
            Ok(value) | Err(Unwind::Return(value)) => Ok(value),
            Err(Unwind::Break) | Err(Unwind::Continue) => Ok(Value::Null),
            // Runtime errors already carry the chain through `mctx`.
            Err(Unwind::Error(err)) => Err(Unwind::Error(err)),
        }
    }

    // ── Generation hook ──────────────────────────────────────────────────

    fn eval_think(&mut self, prompt: &Node, span: Span, ctx: &Rc<Context>) -> Flow<Value> {
        let prompt_value = self.eval(prompt, ctx)?;

        let generated = match self.generator.as_mut() {
            Some(generator) => generator.generate(&prompt_value),
            None => {
                return Err(self.error(
                    "No code generator is configured for 'think'",
                    span,
                    ctx,
                ))
            }
        };
        let text = match generated {
            Ok(text) => text,
            Err(message) => {
                return Err(self.error(format!("Code generation failed: {message}"), span, ctx))
            }
        };

        // The generated text goes back through the normal entry boundary.
        match self.run("<think>", &text) {
            Ok(value) => Ok(value),
            Err(err) => Err(self.error(format!("Generated code failed\n{err}"), span, ctx)),
        }
    }

    // ── Diagnostics ──────────────────────────────────────────────────────

    /// Build a runtime error with the full context-chain traceback.
    ///
    /// The innermost frame points at the error span; each outer frame
    /// points at the call/import site its child was entered from.
    fn error(&self, message: impl Into<String>, span: Span, ctx: &Rc<Context>) -> Unwind {
        let mut err = ThinkError::new(ErrorKind::Runtime, message, span, &ctx.source);
        let mut cursor = span;
        let mut frame: Option<&Context> = Some(ctx);
        while let Some(c) = frame {
            err = err.with_frame(c.name.clone(), cursor);
            cursor = c.entry_span;
            frame = c.parent.as_deref();
        }
        Unwind::Error(Box::new(err))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
