//! Integration tests for the built-in function registry.

use std::fs;
use std::path::PathBuf;
use think_eval::{Interpreter, Value};
use think_types::ThinkError;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn eval_one(source: &str) -> Value {
    match Interpreter::new()
        .run("<test>", source)
        .unwrap_or_else(|e| panic!("unexpected error:\n{e}"))
    {
        Value::List(items) => items
            .borrow()
            .last()
            .cloned()
            .expect("program had no statements"),
        other => panic!("expected a statement list, got {other}"),
    }
}

fn eval_err(source: &str) -> ThinkError {
    Interpreter::new()
        .run("<test>", source)
        .expect_err("expected a runtime error")
}

fn num(n: f64) -> Value {
    Value::Number(n)
}

fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("think-builtin-tests-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir.join(name)
}

// ══════════════════════════════════════════════════════════════════════════════
// Introspection & conversion
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn type_of_reports_value_kinds() {
    assert_eq!(eval_one("type_of(1)"), Value::string("<int>"));
    assert_eq!(eval_one("type_of(1.5)"), Value::string("<float>"));
    assert_eq!(eval_one("type_of(\"x\")"), Value::string("<str>"));
    assert_eq!(eval_one("type_of([])"), Value::string("<list>"));
    assert_eq!(eval_one("type_of(print)"), Value::string("<function>"));
    assert_eq!(eval_one("type_of(null)"), Value::string("<null>"));
}

#[test]
fn kind_predicates() {
    assert_eq!(eval_one("is_number(3)"), num(1.0));
    assert_eq!(eval_one("is_number(\"3\")"), num(0.0));
    assert_eq!(eval_one("is_string(\"s\")"), num(1.0));
    assert_eq!(eval_one("is_list([1])"), num(1.0));
    assert_eq!(eval_one("is_function(print)"), num(1.0));
    assert_eq!(eval_one("func f() -> 0\nis_function(f)"), num(1.0));
}

#[test]
fn tostr_formats_like_display() {
    assert_eq!(eval_one("tostr(3)"), Value::string("3"));
    assert_eq!(eval_one("tostr(3.5)"), Value::string("3.5"));
    assert_eq!(eval_one("tostr([1, \"a\"])"), Value::string("[1, \"a\"]"));
    assert_eq!(eval_one("tostr(null)"), Value::string("null"));
}

#[test]
fn toint_parses_and_truncates() {
    assert_eq!(eval_one("toint(\"12\", false)"), num(12.0));
    assert_eq!(eval_one("toint(3.9, false)"), num(3.0));
}

#[test]
fn toint_suppress_substitutes_null() {
    assert_eq!(eval_one("toint(\"nope\", true)"), Value::Null);
    let err = eval_err("toint(\"nope\", false)");
    assert!(err.message.contains("Failed to convert"));
}

#[test]
fn toint_validates_its_flag() {
    let err = eval_err("toint(\"1\", 2)");
    assert!(err.message.contains("must be a boolean"));
}

#[test]
fn tofloat_parses_decimals() {
    assert_eq!(eval_one("tofloat(\"2.5\", false)"), num(2.5));
    assert_eq!(eval_one("tofloat(\"bad\", true)"), Value::Null);
}

// ══════════════════════════════════════════════════════════════════════════════
// Lists & strings
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn len_of_lists_and_strings() {
    assert_eq!(eval_one("len([1, 2, 3])"), num(3.0));
    assert_eq!(eval_one("len(\"hello\")"), num(5.0));
}

#[test]
fn len_rejects_other_kinds() {
    let err = eval_err("len(5)");
    assert!(err.message.contains("must be a list or string"));
}

#[test]
fn append_mutates_through_every_binding() {
    let source = "
a = [1]
b = a
append(b, 2)
a
";
    assert_eq!(
        eval_one(source),
        Value::list(vec![num(1.0), num(2.0)])
    );
}

#[test]
fn append_concatenates_strings() {
    assert_eq!(eval_one("append(\"ab\", \"cd\")"), Value::string("abcd"));
}

#[test]
fn pop_removes_and_returns() {
    let source = "
xs = [10, 20, 30]
popped = pop(xs, 1)
[popped, len(xs)]
";
    assert_eq!(eval_one(source), Value::list(vec![num(20.0), num(2.0)]));
}

#[test]
fn pop_out_of_bounds() {
    let err = eval_err("pop([1], 5)");
    assert!(err.message.contains("out of bounds"));
}

#[test]
fn extend_appends_in_place() {
    let source = "
xs = [1]
extend(xs, [2, 3])
xs
";
    assert_eq!(
        eval_one(source),
        Value::list(vec![num(1.0), num(2.0), num(3.0)])
    );
}

#[test]
fn extend_validates_both_arguments() {
    let err = eval_err("extend([1], 2)");
    assert!(err.message.contains("Second argument"));
    assert!(err.message.contains("must be a list"));
}

#[test]
fn replace_substitutes_every_occurrence() {
    assert_eq!(
        eval_one("replace(\"a-b-c\", \"-\", \"+\")"),
        Value::string("a+b+c")
    );
}

#[test]
fn split_and_join_round_trip() {
    assert_eq!(
        eval_one("split(\"a,b,c\", \",\")"),
        Value::list(vec![
            Value::string("a"),
            Value::string("b"),
            Value::string("c"),
        ])
    );
    assert_eq!(
        eval_one("join(\",\", split(\"a,b,c\", \",\"))"),
        Value::string("a,b,c")
    );
}

#[test]
fn join_numbers_uses_display_form() {
    assert_eq!(eval_one("join(\"-\", [1, 2, 3])"), Value::string("1-2-3"));
}

// ══════════════════════════════════════════════════════════════════════════════
// The error built-in
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn error_raises_an_ordinary_runtime_error() {
    let err = eval_err("error(\"boom\")");
    assert_eq!(err.kind, think_types::ErrorKind::Runtime);
    assert_eq!(err.message, "boom");
}

#[test]
fn error_requires_a_string() {
    let err = eval_err("error(5)");
    assert!(err.message.contains("must be a string"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Files
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn file_round_trip() {
    let path = temp_path("stream.txt");
    let _ = fs::remove_file(&path);
    let source = format!(
        "
f = open_file(\"{p}\")
write_stream(f, \"hello \")
write_stream(f, \"world\")
read_stream(f)
",
        p = path.display()
    );
    assert_eq!(eval_one(&source), Value::string("hello world"));
}

#[test]
fn file_exists_accepts_strings_and_handles() {
    let path = temp_path("exists.txt");
    fs::write(&path, "x").unwrap();
    let source = format!(
        "[file_exists(\"{p}\"), file_exists(open_file(\"{p}\")), file_exists(\"{p}.missing\")]",
        p = path.display()
    );
    assert_eq!(
        eval_one(&source),
        Value::list(vec![num(1.0), num(1.0), num(0.0)])
    );
}

#[test]
fn read_stream_requires_a_handle() {
    let err = eval_err("read_stream(\"plain string\")");
    assert!(err.message.contains("must be a file"));
}

#[test]
fn run_executes_a_script_against_shared_globals() {
    let path = temp_path("script.think");
    fs::write(&path, "script_ran = 1\n").unwrap();
    let source = format!("run(\"{}\")\nscript_ran", path.display());
    assert_eq!(eval_one(&source), num(1.0));
}

#[test]
fn run_reports_missing_scripts() {
    let err = eval_err("run(\"definitely/not/here.think\")");
    assert!(err.message.contains("Failed to load script"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Environment
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn env_round_trip() {
    let source = "
set_env(\"THINK_BUILTIN_TEST\", \"on\")
get_env(\"THINK_BUILTIN_TEST\")
";
    assert_eq!(eval_one(source), Value::string("on"));
}

#[test]
fn get_env_missing_is_an_error() {
    let err = eval_err("get_env(\"THINK_NO_SUCH_VARIABLE_EXISTS\")");
    assert!(err.message.contains("not found"));
}

#[test]
fn get_dir_returns_a_string() {
    assert_eq!(eval_one("is_string(get_dir())"), num(1.0));
}

#[test]
fn get_now_is_a_positive_number() {
    assert_eq!(eval_one("get_now() > 0"), num(1.0));
}

// ══════════════════════════════════════════════════════════════════════════════
// Random
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn seeded_random_is_reproducible() {
    let source = "
rand_seed(42)
a = random()
rand_seed(42)
b = random()
a == b
";
    assert_eq!(eval_one(source), num(1.0));
}

#[test]
fn random_stays_in_unit_interval() {
    assert_eq!(eval_one("r = random()\nr >= 0 and r < 1"), num(1.0));
}

#[test]
fn rand_int_respects_inclusive_bounds() {
    let source = "
rand_seed(7)
func f() -> for i = 0 to 50 then rand_int(2, 4)
picks = f()
ok = 1
for i = 0 to len(picks) then
    p = picks . i
    if p < 2 then ok = 0
    if p > 4 then ok = 0
end
ok
";
    assert_eq!(eval_one(source), num(1.0));
}

#[test]
fn rand_pick_draws_from_the_list() {
    let source = "
choice = rand_pick([5, 5, 5])
choice == 5
";
    assert_eq!(eval_one(source), num(1.0));
}

#[test]
fn rand_pick_rejects_an_empty_list() {
    let err = eval_err("rand_pick([])");
    assert!(err.message.contains("empty"));
}

#[test]
fn rand_int_rejects_an_empty_range() {
    let err = eval_err("rand_int(5, 1)");
    assert!(err.message.contains("Empty range"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Help & metadata
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn help_lists_every_builtin() {
    let help = eval_one("help()");
    let Value::Str(text) = help else {
        panic!("help() should return a string")
    };
    for builtin in think_eval::BUILTINS {
        assert!(text.contains(builtin.name), "help is missing {}", builtin.name);
    }
}

#[test]
fn help_for_known_and_unknown_names() {
    let Value::Str(text) = eval_one("help_for(\"len\")") else {
        panic!("expected a string")
    };
    assert!(text.contains("args: value"));

    assert_eq!(
        eval_one("help_for(\"not_a_builtin\")"),
        Value::string("No help available")
    );
}

#[test]
fn version_matches_the_crate() {
    assert_eq!(
        eval_one("version()"),
        Value::string(env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn builtins_check_arity_like_user_functions() {
    let err = eval_err("len()");
    assert_eq!(err.message, "1 too few arguments passed into 'len'");
    let err = eval_err("len([1], [2])");
    assert_eq!(err.message, "1 too many arguments passed into 'len'");
}

#[test]
fn builtins_are_first_class_values() {
    assert_eq!(eval_one("l = len\nl(\"abc\")"), num(3.0));
}
