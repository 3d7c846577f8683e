use crate::backend::{self, ExecutionResult, FailureOrigin, Severity};
use crate::diagnostics::NullSink;
use crate::language::types::Type;
use crate::runtime::value::Value;

fn run(source: &str) -> ExecutionResult {
    backend::run(source, &NullSink)
}

fn expect_success(source: &str) -> (String, Vec<(String, Value)>) {
    match run(source) {
        ExecutionResult::Success { stdout, bindings } => (
            stdout,
            bindings.into_iter().map(|b| (b.name, b.value)).collect(),
        ),
        other => panic!("expected success, got {other:?}"),
    }
}

#[test]
fn captures_printed_output() {
    let (stdout, _) = expect_success("void main() {\n    print(2 + 2);\n}\n");
    assert_eq!(stdout, "4\n");
}

#[test]
fn reports_root_bindings_with_types() {
    let (stdout, bindings) =
        expect_success("void main() {\n    int a = 5;\n    bool flag = a > 3;\n}\n");
    assert_eq!(stdout, "");
    assert_eq!(
        bindings,
        vec![
            ("a".to_string(), Value::Int(5)),
            ("flag".to_string(), Value::Bool(true)),
        ]
    );
    assert_eq!(bindings[1].1.type_of(), Type::Bool);
}

#[test]
fn mutation_is_visible_in_the_final_binding() {
    let (_, bindings) = expect_success("void main() {\n    int a = 5;\n    a = a + 1;\n}\n");
    assert_eq!(bindings, vec![("a".to_string(), Value::Int(6))]);
}

#[test]
fn show_prints_values_but_stays_quiet_for_void() {
    let (stdout, _) = expect_success("void main() {\n    show(6);\n}\n");
    assert_eq!(stdout, "6\n");

    let source = "\
void hello() {
    print(\"hi\");
}

void main() {
    show(hello());
}
";
    let (stdout, _) = expect_success(source);
    assert_eq!(stdout, "hi\n");
}

#[test]
fn type_errors_come_back_as_compile_diagnostics() {
    match run("void main() {\n    int a = \"hi\";\n}\n") {
        ExecutionResult::CompileFailure(diagnostics) => {
            assert!(!diagnostics.is_empty());
        }
        other => panic!("expected compile failure, got {other:?}"),
    }
}

#[test]
fn deeply_nested_expressions_fail_compilation() {
    let expr = format!("{}1{}", "(".repeat(50_000), ")".repeat(50_000));
    let source = format!("void main() {{\n    int a = {expr};\n}}\n");
    assert!(matches!(run(&source), ExecutionResult::CompileFailure(_)));
}

#[test]
fn unknown_import_compiles_with_a_warning() {
    let unit = backend::compile("import nowhere;\n\nvoid main() {\n}\n")
        .unwrap_or_else(|diagnostics| panic!("expected success, got {diagnostics:?}"));
    assert_eq!(unit.warnings().len(), 1);
    assert_eq!(unit.warnings()[0].severity, Severity::Warning);
    assert!(unit.warnings()[0].message.contains("nowhere"));

    // The program still runs; only calls into the module are errors.
    let (stdout, _) = expect_success("import nowhere;\n\nvoid main() {\n    print(1);\n}\n");
    assert_eq!(stdout, "1\n");
}

#[test]
fn known_imports_carry_no_warnings() {
    let unit = backend::compile("import math;\n\nvoid main() {\n}\n")
        .unwrap_or_else(|diagnostics| panic!("expected success, got {diagnostics:?}"));
    assert!(unit.warnings().is_empty());
}

#[test]
fn parse_errors_come_back_as_compile_diagnostics() {
    assert!(matches!(
        run("void main() {\n    int a = ;\n}\n"),
        ExecutionResult::CompileFailure(_)
    ));
}

#[test]
fn division_by_zero_is_a_user_code_failure() {
    match run("void main() {\n    int a = 1 / 0;\n}\n") {
        ExecutionResult::RuntimeFailure { origin, message } => {
            assert_eq!(origin, FailureOrigin::UserCode);
            assert!(message.contains("division by zero"), "message: {message}");
        }
        other => panic!("expected runtime failure, got {other:?}"),
    }
}

#[test]
fn missing_entry_point_is_an_internal_failure() {
    match run("int one() {\n    return 1;\n}\n") {
        ExecutionResult::RuntimeFailure { origin, message } => {
            assert_eq!(origin, FailureOrigin::Internal);
            assert!(message.contains("main"), "message: {message}");
        }
        other => panic!("expected load failure, got {other:?}"),
    }
}

#[test]
fn module_calls_require_the_import() {
    assert!(matches!(
        run("void main() {\n    print(math.abs(-3));\n}\n"),
        ExecutionResult::CompileFailure(_)
    ));

    let (stdout, _) = expect_success("import math;\n\nvoid main() {\n    print(math.abs(-3));\n}\n");
    assert_eq!(stdout, "3\n");
}

#[test]
fn string_builtins_work_through_their_module() {
    let source = "\
import strings;

void main() {
    print(strings.len(\"four\"));
    print(strings.upper(\"hi\"));
}
";
    let (stdout, _) = expect_success(source);
    assert_eq!(stdout, "4\nHI\n");
}
