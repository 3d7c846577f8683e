use crate::engine::session::SessionState;
use crate::language::types::Type;

#[test]
fn imports_are_idempotent_by_path() {
    let mut session = SessionState::new();
    session.insert_import("math", "import math;");
    session.insert_import("math", "import math;");
    session.insert_import("strings", "import strings;");

    let paths: Vec<_> = session.imports().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, ["math", "strings"]);
    assert!(session.has_import("math"));
    assert!(!session.has_import("io"));
}

#[test]
fn redeclared_module_decl_keeps_its_position() {
    let mut session = SessionState::new();
    session.insert_module_decl("add", "int add(int a, int b) { return a + b; }");
    session.insert_module_decl("sub", "int sub(int a, int b) { return a - b; }");
    session.insert_module_decl("add", "int add(int a, int b) { return b + a; }");

    let names: Vec<_> = session
        .module_decls()
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(names, ["add", "sub"]);
    assert_eq!(
        session.module_decls()[0].text,
        "int add(int a, int b) { return b + a; }"
    );
}

#[test]
fn redeclared_variable_updates_type_and_value_in_place() {
    let mut session = SessionState::new();
    session.insert_variable("a", Type::Int, "5");
    session.insert_variable("b", Type::Bool, "true");
    session.insert_variable("a", Type::Str, "\"hi\"");

    let names: Vec<_> = session.variables().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(session.variables()[0].ty, Type::Str);
    assert_eq!(session.variables()[0].value, "\"hi\"");
}

#[test]
fn statements_accumulate_in_order() {
    let mut session = SessionState::new();
    session.push_statement("print(a);");
    session.push_statement("a = a + 1;");
    assert_eq!(session.statements(), ["print(a);", "a = a + 1;"]);
}

#[test]
fn clone_makes_an_independent_rollback_snapshot() {
    let mut session = SessionState::new();
    session.insert_import("math", "import math;");
    session.insert_variable("a", Type::Int, "5");

    let snapshot = session.clone();
    session.push_statement("a = a + 1;");
    assert_ne!(session, snapshot);

    session = snapshot.clone();
    assert_eq!(session, snapshot);
}
