//! The built-in function registry.
//!
//! A fixed compile-time table mapping each name to a native handler
//! plus its ordered parameter-name list. The table is registered into
//! the global symbol table once at interpreter construction and is
//! read-only afterwards.
//!
//! Handlers validate every argument's kind themselves and return a
//! bare message on failure; the evaluator attaches the call site's
//! span and context chain. There is no implicit coercion — the only
//! conversions are the explicit ones (`toint`, `tofloat`, `tostr`).

use crate::evaluator::Interpreter;
use crate::value::{resolve_index, FileHandle, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// A native operation exposed to the language as a callable value.
#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    /// Ordered parameter names, used for arity checking and help text.
    pub params: &'static [&'static str],
    pub run: fn(&mut Interpreter, &[Value]) -> Result<Value, String>,
}

/// Every built-in, in registration order.
pub static BUILTINS: &[Builtin] = &[
    // ── Core ──
    Builtin { name: "print", params: &["value"], run: handlers::print },
    Builtin { name: "gets", params: &["prompt"], run: handlers::gets },
    Builtin { name: "clear", params: &[], run: handlers::clear },
    Builtin { name: "type_of", params: &["value"], run: handlers::type_of },
    Builtin { name: "is_number", params: &["value"], run: handlers::is_number },
    Builtin { name: "is_string", params: &["value"], run: handlers::is_string },
    Builtin { name: "is_list", params: &["value"], run: handlers::is_list },
    Builtin { name: "is_function", params: &["value"], run: handlers::is_function },
    Builtin { name: "tostr", params: &["value"], run: handlers::tostr },
    Builtin { name: "toint", params: &["value", "suppress_error"], run: handlers::toint },
    Builtin { name: "tofloat", params: &["value", "suppress_error"], run: handlers::tofloat },
    Builtin { name: "len", params: &["value"], run: handlers::len },
    Builtin { name: "append", params: &["object", "value"], run: handlers::append },
    Builtin { name: "pop", params: &["list", "index"], run: handlers::pop },
    Builtin { name: "extend", params: &["listA", "listB"], run: handlers::extend },
    Builtin { name: "replace", params: &["string", "value", "with"], run: handlers::replace },
    Builtin { name: "split", params: &["string", "sep"], run: handlers::split },
    Builtin { name: "join", params: &["sep", "elements"], run: handlers::join },
    Builtin { name: "error", params: &["message"], run: handlers::error },
    Builtin { name: "help", params: &[], run: handlers::help },
    Builtin { name: "help_for", params: &["funcname"], run: handlers::help_for },
    Builtin { name: "version", params: &[], run: handlers::version },
    // ── Scripts & processes ──
    Builtin { name: "run", params: &["fn"], run: handlers::run_script },
    Builtin { name: "sys", params: &["command"], run: handlers::sys },
    Builtin { name: "sleep", params: &["seconds"], run: handlers::sleep },
    Builtin { name: "exit", params: &[], run: handlers::exit },
    // ── Files ──
    Builtin { name: "open_file", params: &["file_path"], run: handlers::open_file },
    Builtin { name: "read_stream", params: &["file"], run: handlers::read_stream },
    Builtin { name: "write_stream", params: &["file", "text"], run: handlers::write_stream },
    Builtin { name: "file_exists", params: &["file_path"], run: handlers::file_exists },
    // ── Environment ──
    Builtin { name: "get_now", params: &[], run: handlers::get_now },
    Builtin { name: "get_env", params: &["name"], run: handlers::get_env },
    Builtin { name: "set_env", params: &["name", "value"], run: handlers::set_env },
    Builtin { name: "get_dir", params: &[], run: handlers::get_dir },
    Builtin { name: "set_dir", params: &["name"], run: handlers::set_dir },
    // ── Random ──
    Builtin { name: "random", params: &[], run: handlers::random },
    Builtin { name: "rand_int", params: &["min", "max"], run: handlers::rand_int },
    Builtin { name: "rand_seed", params: &["seed"], run: handlers::rand_seed },
    Builtin { name: "rand_pick", params: &["arr"], run: handlers::rand_pick },
];

/// Find a built-in by name.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

// ─────────────────────────────────────────────────────────────────────
// Argument validation
// ─────────────────────────────────────────────────────────────────────

fn ordinal(index: usize) -> &'static str {
    ["First", "Second", "Third", "Fourth"]
        .get(index)
        .copied()
        .unwrap_or("Argument")
}

fn number_arg(args: &[Value], index: usize, name: &str) -> Result<f64, String> {
    match &args[index] {
        Value::Number(n) => Ok(*n),
        other => Err(format!(
            "{} argument for '{name}' must be a number, got {}",
            ordinal(index),
            other.type_name()
        )),
    }
}

fn string_arg<'a>(args: &'a [Value], index: usize, name: &str) -> Result<&'a str, String> {
    match &args[index] {
        Value::Str(s) => Ok(s),
        other => Err(format!(
            "{} argument for '{name}' must be a string, got {}",
            ordinal(index),
            other.type_name()
        )),
    }
}

fn list_arg<'a>(
    args: &'a [Value],
    index: usize,
    name: &str,
) -> Result<&'a Rc<RefCell<Vec<Value>>>, String> {
    match &args[index] {
        Value::List(items) => Ok(items),
        other => Err(format!(
            "{} argument for '{name}' must be a list, got {}",
            ordinal(index),
            other.type_name()
        )),
    }
}

fn file_arg<'a>(args: &'a [Value], index: usize, name: &str) -> Result<&'a FileHandle, String> {
    match &args[index] {
        Value::File(handle) => Ok(handle),
        other => Err(format!(
            "{} argument for '{name}' must be a file, got {}",
            ordinal(index),
            other.type_name()
        )),
    }
}

/// A language boolean: a Number that is exactly 0 or 1.
fn bool_arg(args: &[Value], index: usize, name: &str) -> Result<bool, String> {
    match number_arg(args, index, name)? {
        n if n == 0.0 => Ok(false),
        n if n == 1.0 => Ok(true),
        _ => Err(format!(
            "{} argument for '{name}' must be a boolean",
            ordinal(index)
        )),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────

mod handlers {
    use super::*;
    use rand::{Rng, SeedableRng};
    use std::io::Write;
    use std::path::Path;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    // ── Core ─────────────────────────────────────────────────────────

    pub(super) fn print(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        match &args[0] {
            Value::Str(s) => println!("{s}"),
            other => println!("{}", other.repr()),
        }
        Ok(Value::Null)
    }

    pub(super) fn gets(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        print!("{}", args[0]);
        std::io::stdout().flush().map_err(|e| e.to_string())?;
        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .map_err(|e| format!("Failed to read input\n{e}"))?;
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Value::Str(line))
    }

    pub(super) fn clear(_: &mut Interpreter, _: &[Value]) -> Result<Value, String> {
        print!("\x1b[2J\x1b[1;1H");
        let _ = std::io::stdout().flush();
        Ok(Value::Null)
    }

    pub(super) fn type_of(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        Ok(Value::string(args[0].type_name()))
    }

    pub(super) fn is_number(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        Ok(Value::bool(matches!(args[0], Value::Number(_))))
    }

    pub(super) fn is_string(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        Ok(Value::bool(matches!(args[0], Value::Str(_))))
    }

    pub(super) fn is_list(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        Ok(Value::bool(matches!(args[0], Value::List(_))))
    }

    pub(super) fn is_function(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        Ok(Value::bool(matches!(
            args[0],
            Value::Function(_) | Value::Builtin(_)
        )))
    }

    pub(super) fn tostr(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        Ok(Value::string(args[0].to_string()))
    }

    pub(super) fn toint(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let suppress = bool_arg(args, 1, "toint")?;
        match &args[0] {
            Value::Number(n) => Ok(Value::Number(n.trunc())),
            Value::Str(s) => match s.trim().parse::<i64>() {
                Ok(n) => Ok(Value::Number(n as f64)),
                Err(_) if suppress => Ok(Value::Null),
                Err(_) => Err(format!(
                    "Failed to convert '{s}' of type '<str>' to integer"
                )),
            },
            _ if suppress => Ok(Value::Null),
            other => Err(format!(
                "Failed to convert value of type '{}' to integer",
                other.type_name()
            )),
        }
    }

    pub(super) fn tofloat(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let suppress = bool_arg(args, 1, "tofloat")?;
        match &args[0] {
            Value::Number(n) => Ok(Value::Number(*n)),
            Value::Str(s) => match s.trim().parse::<f64>() {
                Ok(n) => Ok(Value::Number(n)),
                Err(_) if suppress => Ok(Value::Null),
                Err(_) => Err(format!("Failed to convert '{s}' of type '<str>' to float")),
            },
            _ if suppress => Ok(Value::Null),
            other => Err(format!(
                "Failed to convert value of type '{}' to float",
                other.type_name()
            )),
        }
    }

    pub(super) fn len(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        match &args[0] {
            Value::List(items) => Ok(Value::Number(items.borrow().len() as f64)),
            Value::Str(s) => Ok(Value::Number(s.chars().count() as f64)),
            other => Err(format!(
                "Argument for 'len' must be a list or string, got {}",
                other.type_name()
            )),
        }
    }

    /// Appends in place for lists (shared-reference mutation), returns
    /// a new string for string + string.
    pub(super) fn append(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        match &args[0] {
            Value::List(items) => {
                items.borrow_mut().push(args[1].clone());
                Ok(args[1].clone())
            }
            Value::Str(s) => {
                let suffix = string_arg(args, 1, "append")?;
                Ok(Value::string(format!("{s}{suffix}")))
            }
            other => Err(format!(
                "Invalid argument for 'append': {}",
                other.type_name()
            )),
        }
    }

    pub(super) fn pop(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let items = list_arg(args, 0, "pop")?;
        let index = number_arg(args, 1, "pop")?;
        let mut items = items.borrow_mut();
        let idx = resolve_index(index, items.len()).map_err(|_| {
            "Element at this index could not be removed from list because index is out of bounds"
                .to_string()
        })?;
        Ok(items.remove(idx))
    }

    pub(super) fn extend(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let target = list_arg(args, 0, "extend")?;
        let extra = list_arg(args, 1, "extend")?;
        // Copy out first so `extend(xs, xs)` doesn't hold two borrows.
        let extra: Vec<Value> = extra.borrow().clone();
        target.borrow_mut().extend(extra);
        Ok(Value::Null)
    }

    pub(super) fn replace(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let haystack = string_arg(args, 0, "replace")?;
        let needle = string_arg(args, 1, "replace")?;
        let with = string_arg(args, 2, "replace")?;
        Ok(Value::string(haystack.replace(needle, with)))
    }

    pub(super) fn split(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let value = string_arg(args, 0, "split")?;
        let sep = string_arg(args, 1, "split")?;
        let sep = if sep.is_empty() { " " } else { sep };
        let parts = value.split(sep).map(Value::string).collect();
        Ok(Value::list(parts))
    }

    pub(super) fn join(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let sep = string_arg(args, 0, "join")?;
        match &args[1] {
            Value::List(items) => {
                let parts: Vec<String> =
                    items.borrow().iter().map(|v| v.to_string()).collect();
                Ok(Value::string(parts.join(sep)))
            }
            Value::Str(s) => {
                let parts: Vec<String> = s.chars().map(String::from).collect();
                Ok(Value::string(parts.join(sep)))
            }
            other => Err(format!(
                "Second argument for 'join' must be a list or a string, got {}",
                other.type_name()
            )),
        }
    }

    /// The user-raised error path: indistinguishable from engine-raised
    /// runtime errors once it leaves here.
    pub(super) fn error(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let message = string_arg(args, 0, "error")?;
        Err(message.to_string())
    }

    pub(super) fn help(_: &mut Interpreter, _: &[Value]) -> Result<Value, String> {
        Ok(Value::string(help_overview()))
    }

    pub(super) fn help_for(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let name = string_arg(args, 0, "help_for")?;
        if name.is_empty() {
            return Ok(Value::string(help_overview()));
        }
        match HELP_TOPICS.iter().find(|(topic, ..)| *topic == name) {
            Some((_, args_desc, returns, text)) => Ok(Value::string(format!(
                "- {text}\n    - args: {args_desc}\n    - returns: {returns}"
            ))),
            None => Ok(Value::string("No help available")),
        }
    }

    pub(super) fn version(_: &mut Interpreter, _: &[Value]) -> Result<Value, String> {
        Ok(Value::string(env!("CARGO_PKG_VERSION")))
    }

    // ── Scripts & processes ──────────────────────────────────────────

    pub(super) fn run_script(interp: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let path = string_arg(args, 0, "run")?;
        let script = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to load script \"{path}\"\n{e}"))?;
        interp
            .run(path, &script)
            .map_err(|e| format!("Failed to finish executing script \"{path}\"\n{e}"))?;
        Ok(Value::Null)
    }

    pub(super) fn sys(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let command = string_arg(args, 0, "sys")?;
        let status = shell_command(command).status();
        match status {
            Ok(_) => Ok(Value::Null),
            Err(e) => Err(format!("Failed to execute '{command}'\n{e}")),
        }
    }

    #[cfg(unix)]
    fn shell_command(command: &str) -> std::process::Command {
        let mut cmd = std::process::Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }

    #[cfg(not(unix))]
    fn shell_command(command: &str) -> std::process::Command {
        let mut cmd = std::process::Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }

    /// Blocks the single execution thread — the language's only pause
    /// primitive.
    pub(super) fn sleep(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let seconds = number_arg(args, 0, "sleep")?;
        std::thread::sleep(Duration::from_secs_f64(seconds.max(0.0)));
        Ok(Value::Null)
    }

    pub(super) fn exit(_: &mut Interpreter, _: &[Value]) -> Result<Value, String> {
        std::process::exit(0)
    }

    // ── Files ────────────────────────────────────────────────────────

    pub(super) fn open_file(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let path = string_arg(args, 0, "open_file")?;
        let name = Path::new(path).with_extension("").display().to_string();
        Ok(Value::File(Rc::new(FileHandle {
            name,
            path: path.into(),
        })))
    }

    pub(super) fn read_stream(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let handle = file_arg(args, 0, "read_stream")?;
        std::fs::read_to_string(&handle.path)
            .map(Value::string)
            .map_err(|e| format!("Failed to read file \"{}\"\n{e}", handle.path.display()))
    }

    pub(super) fn write_stream(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let handle = file_arg(args, 0, "write_stream")?;
        let text = string_arg(args, 1, "write_stream")?;
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&handle.path)
            .map_err(|e| format!("Failed to write to file \"{}\"\n{e}", handle.path.display()))?;
        file.write_all(text.as_bytes())
            .map_err(|e| format!("Failed to write to file \"{}\"\n{e}", handle.path.display()))?;
        Ok(Value::Null)
    }

    pub(super) fn file_exists(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let path = match &args[0] {
            Value::Str(s) => Path::new(s).to_path_buf(),
            Value::File(handle) => handle.path.clone(),
            other => {
                return Err(format!(
                    "First argument for 'file_exists' must be a string or file, got {}",
                    other.type_name()
                ))
            }
        };
        Ok(Value::bool(path.exists()))
    }

    // ── Environment ──────────────────────────────────────────────────

    pub(super) fn get_now(_: &mut Interpreter, _: &[Value]) -> Result<Value, String> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| Value::Number(d.as_secs_f64()))
            .map_err(|e| format!("Failed to read the system clock\n{e}"))
    }

    pub(super) fn get_env(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let name = string_arg(args, 0, "get_env")?;
        std::env::var(name)
            .map(Value::string)
            .map_err(|_| format!("Environment variable '{name}' not found"))
    }

    pub(super) fn set_env(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let name = string_arg(args, 0, "set_env")?;
        let value = string_arg(args, 1, "set_env")?;
        std::env::set_var(name, value);
        Ok(Value::Null)
    }

    pub(super) fn get_dir(_: &mut Interpreter, _: &[Value]) -> Result<Value, String> {
        std::env::current_dir()
            .map(|p| Value::string(p.display().to_string()))
            .map_err(|e| format!("Failed to get current directory\n{e}"))
    }

    pub(super) fn set_dir(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let name = string_arg(args, 0, "set_dir")?;
        std::env::set_current_dir(name)
            .map_err(|e| format!("Failed to set current directory to '{name}'\n{e}"))?;
        Ok(Value::Null)
    }

    // ── Random ───────────────────────────────────────────────────────

    pub(super) fn random(interp: &mut Interpreter, _: &[Value]) -> Result<Value, String> {
        Ok(Value::Number(interp.rng.gen::<f64>()))
    }

    pub(super) fn rand_int(interp: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let min = number_arg(args, 0, "rand_int")?.trunc() as i64;
        let max = number_arg(args, 1, "rand_int")?.trunc() as i64;
        if min > max {
            return Err(format!("Empty range for 'rand_int': {min} > {max}"));
        }
        Ok(Value::Number(interp.rng.gen_range(min..=max) as f64))
    }

    pub(super) fn rand_seed(interp: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let seed = number_arg(args, 0, "rand_seed")?;
        interp.rng = rand::rngs::StdRng::seed_from_u64(seed.trunc() as i64 as u64);
        Ok(Value::Null)
    }

    pub(super) fn rand_pick(interp: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
        let items = list_arg(args, 0, "rand_pick")?;
        let items = items.borrow();
        if items.is_empty() {
            return Err("List passed to 'rand_pick' is empty".to_string());
        }
        let index = interp.rng.gen_range(0..items.len());
        Ok(items[index].clone())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Help text
// ─────────────────────────────────────────────────────────────────────

/// (name, args, returns, description) — consulted by `help_for`.
static HELP_TOPICS: &[(&str, &str, &str, &str)] = &[
    ("print", "value", "null", "Write a value to standard output"),
    ("gets", "prompt", "string", "Read one line of input after showing a prompt"),
    ("type_of", "value", "string", "The type tag of a value, e.g. <int> or <list>"),
    ("tostr", "value", "string", "Convert any value to its display string"),
    ("toint", "value, suppress_error", "number or null", "Convert a number or numeric string to an integer"),
    ("tofloat", "value, suppress_error", "number or null", "Convert a number or numeric string to a float"),
    ("len", "value", "number", "Length of a list or string"),
    ("append", "object, value", "value", "Push onto a list in place, or concatenate strings"),
    ("pop", "list, index", "value", "Remove and return the element at an index"),
    ("extend", "listA, listB", "null", "Append every element of listB onto listA"),
    ("replace", "string, value, with", "string", "Replace every occurrence of a substring"),
    ("split", "string, sep", "list", "Split a string on a separator"),
    ("join", "sep, elements", "string", "Join list elements or characters with a separator"),
    ("error", "message", "never", "Raise a runtime error with the given message"),
    ("run", "fn", "null", "Execute another script file"),
    ("sys", "command", "null", "Run a shell command"),
    ("sleep", "seconds", "null", "Block execution for a duration"),
    ("open_file", "file_path", "file", "Create a handle for a file path"),
    ("read_stream", "file", "string", "Read a whole file as text"),
    ("write_stream", "file, text", "null", "Append text to a file"),
    ("file_exists", "file_path", "boolean", "Whether a path exists"),
    ("get_now", "", "number", "Seconds since the Unix epoch"),
    ("get_env", "name", "string", "Read an environment variable"),
    ("set_env", "name, value", "null", "Set an environment variable"),
    ("random", "", "number", "A uniform float in [0, 1)"),
    ("rand_int", "min, max", "number", "A uniform integer in [min, max]"),
    ("rand_seed", "seed", "null", "Reseed the random generator"),
    ("rand_pick", "arr", "value", "A uniformly chosen list element"),
];

fn help_overview() -> String {
    let mut out = String::from(
        "ThinkLang built-in functions. Use help_for(\"name\") for details.\n",
    );
    for builtin in BUILTINS {
        out.push_str("  ");
        out.push_str(builtin.name);
        out.push('(');
        out.push_str(&builtin.params.join(", "));
        out.push_str(")\n");
    }
    out
}
