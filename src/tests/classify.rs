use crate::engine::classify::{classify, SnippetCategory};
use crate::engine::error::ClassifyError;
use std::time::Duration;

const BUDGET: Duration = Duration::from_millis(100);

fn category(raw: &str) -> SnippetCategory {
    classify(raw, BUDGET)
        .unwrap_or_else(|err| panic!("expected {raw:?} to classify, got {err}"))
        .category
}

#[test]
fn import_wins_over_everything() {
    assert_eq!(category("import math;"), SnippetCategory::Import);
    assert_eq!(category("  import strings;  "), SnippetCategory::Import);
}

#[test]
fn function_definition_is_a_module_declaration() {
    assert_eq!(
        category("int add(int a, int b) { return a + b; }"),
        SnippetCategory::ModuleDeclaration
    );
    assert_eq!(
        category("void hello() { print(\"hi\"); }"),
        SnippetCategory::ModuleDeclaration
    );
}

#[test]
fn typed_initializer_is_a_variable_declaration() {
    assert_eq!(category("int a = 5;"), SnippetCategory::VariableDeclaration);
    assert_eq!(
        category("string s = \"hi\";"),
        SnippetCategory::VariableDeclaration
    );
}

#[test]
fn call_with_semicolon_is_a_statement() {
    assert_eq!(category("print(a);"), SnippetCategory::Statement);
    assert_eq!(category("foo();"), SnippetCategory::Statement);
}

#[test]
fn assignment_and_control_flow_are_statements() {
    assert_eq!(category("a = a + 1;"), SnippetCategory::Statement);
    assert_eq!(
        category("if (a > 0) { print(a); }"),
        SnippetCategory::Statement
    );
    assert_eq!(
        category("while (a < 3) { a = a + 1; }"),
        SnippetCategory::Statement
    );
}

#[test]
fn bare_expressions_fall_through_to_expression() {
    assert_eq!(category("a + 1"), SnippetCategory::Expression);
    // A trailing semicolon does not turn a bare expression into a statement.
    assert_eq!(category("a + 1;"), SnippetCategory::Expression);
    assert_eq!(category("42"), SnippetCategory::Expression);
}

#[test]
fn call_without_semicolon_is_an_expression() {
    assert_eq!(category("add(2, 3)"), SnippetCategory::Expression);
}

#[test]
fn classification_is_deterministic() {
    for _ in 0..3 {
        assert_eq!(category("foo();"), SnippetCategory::Statement);
    }
}

#[test]
fn empty_input_is_no_match() {
    assert!(matches!(
        classify("", BUDGET),
        Err(ClassifyError::NoMatch { .. })
    ));
    assert!(matches!(
        classify("   \n  ", BUDGET),
        Err(ClassifyError::NoMatch { .. })
    ));
}

#[test]
fn gibberish_is_no_match() {
    assert!(matches!(
        classify("@#$%", BUDGET),
        Err(ClassifyError::NoMatch { .. })
    ));
}

#[test]
fn top_level_return_is_no_match() {
    // `return` is rejected by the statement production and is not an
    // expression either.
    assert!(matches!(
        classify("return 5;", BUDGET),
        Err(ClassifyError::NoMatch { .. })
    ));
}

#[test]
fn zero_budget_times_out() {
    assert!(matches!(
        classify("int a = 5;", Duration::ZERO),
        Err(ClassifyError::Timeout { .. })
    ));
}

#[test]
fn oversized_input_is_abandoned_mid_parse() {
    // Long enough that some attempt is still parsing when the budget runs
    // out, which exercises the in-flight cancellation path.
    let raw = format!("{}1", "1+".repeat(100_000));
    let start = std::time::Instant::now();
    assert!(matches!(
        classify(&raw, Duration::from_millis(1)),
        Err(ClassifyError::Timeout { .. })
    ));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn deep_parentheses_are_rejected_not_fatal() {
    let raw = format!("{}1{}", "(".repeat(50_000), ")".repeat(50_000));
    assert!(matches!(
        classify(&raw, Duration::from_secs(5)),
        Err(ClassifyError::NoMatch { .. })
    ));
}

#[test]
fn deep_unary_chains_are_rejected_not_fatal() {
    let raw = format!("{}1", "-".repeat(50_000));
    assert!(matches!(
        classify(&raw, Duration::from_secs(5)),
        Err(ClassifyError::NoMatch { .. })
    ));
}

#[test]
fn deep_statement_nesting_is_rejected_not_fatal() {
    let raw = format!(
        "{}print(1);{}",
        "if (true) { ".repeat(50_000),
        " }".repeat(50_000)
    );
    assert!(matches!(
        classify(&raw, Duration::from_secs(5)),
        Err(ClassifyError::NoMatch { .. })
    ));
}
