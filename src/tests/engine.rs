use crate::diagnostics::NullSink;
use crate::engine::error::TurnError;
use crate::engine::{EngineConfig, ReplEngine};
use std::sync::Arc;

fn engine() -> ReplEngine {
    ReplEngine::new(EngineConfig::default(), Arc::new(NullSink))
}

fn ok(engine: &mut ReplEngine, raw: &str) -> String {
    engine
        .submit_turn(raw)
        .unwrap_or_else(|err| panic!("turn {raw:?} failed: {}", err.user_message()))
}

#[test]
fn default_engine_is_ready_to_use() {
    let mut repl = ReplEngine::default();
    assert_eq!(ok(&mut repl, "1 + 1"), "2\n");
}

#[test]
fn declare_then_observe() {
    let mut repl = engine();
    assert_eq!(ok(&mut repl, "int a = 5;"), "");
    assert_eq!(ok(&mut repl, "a + 1"), "6\n");
}

#[test]
fn define_function_then_call_it() {
    let mut repl = engine();
    assert_eq!(ok(&mut repl, "int add(int a, int b) { return a + b; }"), "");
    assert_eq!(ok(&mut repl, "add(2, 3)"), "5\n");
}

#[test]
fn import_gates_module_functions() {
    let mut repl = engine();
    assert!(matches!(
        repl.submit_turn("math.abs(-7)"),
        Err(TurnError::Compile { .. })
    ));
    assert_eq!(ok(&mut repl, "import math;"), "");
    assert_eq!(ok(&mut repl, "math.abs(-7)"), "7\n");
}

#[test]
fn failed_turn_rolls_the_session_back() {
    let mut repl = engine();
    ok(&mut repl, "int a = 5;");
    let before = repl.session().clone();

    assert!(matches!(
        repl.submit_turn("int b = nope;"),
        Err(TurnError::Compile { .. })
    ));
    assert!(matches!(
        repl.submit_turn("1 / 0"),
        Err(TurnError::Runtime { .. })
    ));
    assert_eq!(repl.session(), &before);

    // The session still works after the failures.
    assert_eq!(ok(&mut repl, "a + 1"), "6\n");
}

#[test]
fn historical_expressions_do_not_repeat_their_output() {
    let mut repl = engine();
    ok(&mut repl, "int a = 5;");
    assert_eq!(ok(&mut repl, "a + 1"), "6\n");
    // The previous expression replays silently; only the new one is shown.
    assert_eq!(ok(&mut repl, "a + 2"), "7\n");
}

#[test]
fn historical_print_statements_repeat_their_output() {
    let mut repl = engine();
    ok(&mut repl, "int a = 5;");
    assert_eq!(ok(&mut repl, "print(a);"), "5\n");
    assert_eq!(ok(&mut repl, "a + 1"), "5\n6\n");
}

#[test]
fn assignment_statements_update_later_observations() {
    let mut repl = engine();
    ok(&mut repl, "int a = 5;");
    assert_eq!(ok(&mut repl, "a = a + 1;"), "");
    assert_eq!(ok(&mut repl, "a"), "6\n");
    // The observation is stable: replaying it does not advance `a` twice.
    assert_eq!(ok(&mut repl, "a"), "6\n");
}

#[test]
fn redeclaration_freezes_the_observed_value() {
    let mut repl = engine();
    ok(&mut repl, "int a = 5;");
    ok(&mut repl, "int a = 10;");
    assert_eq!(ok(&mut repl, "a"), "10\n");

    let entry = &repl.session().variables()[0];
    assert_eq!(entry.name, "a");
    assert_eq!(entry.value, "10");
    assert_eq!(repl.session().variables().len(), 1);
}

#[test]
fn redefined_function_takes_effect() {
    let mut repl = engine();
    ok(&mut repl, "int twice(int x) { return x + x; }");
    assert_eq!(ok(&mut repl, "twice(4)"), "8\n");
    ok(&mut repl, "int twice(int x) { return x * 3; }");
    assert_eq!(ok(&mut repl, "twice(4)"), "12\n");
}

#[test]
fn classification_failure_reports_without_committing() {
    let mut repl = engine();
    let before = repl.session().clone();
    assert!(matches!(
        repl.submit_turn("return 5;"),
        Err(TurnError::Classify(_))
    ));
    assert_eq!(repl.session(), &before);
}

#[test]
fn submit_flattens_errors_into_messages() {
    let mut repl = engine();
    let outcome = repl.submit("int a = 5;");
    assert!(outcome.success);
    assert_eq!(outcome.output, "");

    let outcome = repl.submit("1 / 0");
    assert!(!outcome.success);
    assert!(outcome.output.contains("division by zero"));
}

#[test]
fn string_values_survive_redeclaration_turns() {
    let mut repl = engine();
    ok(&mut repl, "string s = \"hi\";");
    ok(&mut repl, "import strings;");
    assert_eq!(ok(&mut repl, "strings.upper(s)"), "HI\n");
}
