use crate::engine::classify::{Snippet, SnippetCategory};
use crate::engine::session::SessionState;
use crate::engine::synthesize::synthesize;
use crate::language::types::Type;

#[test]
fn empty_session_expression_produces_minimal_program() {
    let session = SessionState::new();
    let snippet = Snippet::new(SnippetCategory::Expression, "1 + 2");
    assert_eq!(
        synthesize(&session, &snippet),
        "void main() {\n    show(1 + 2);\n}\n"
    );
}

#[test]
fn trailing_semicolon_on_an_expression_is_not_doubled() {
    let session = SessionState::new();
    let snippet = Snippet::new(SnippetCategory::Expression, "add(2, 3);");
    assert_eq!(
        synthesize(&session, &snippet),
        "void main() {\n    show(add(2, 3));\n}\n"
    );
}

#[test]
fn full_session_follows_the_template() {
    let mut session = SessionState::new();
    session.insert_import("math", "import math;");
    session.insert_module_decl("add", "int add(int a, int b) { return a + b; }");
    session.insert_variable("a", Type::Int, "5");
    session.push_statement("print(a);");

    let snippet = Snippet::new(SnippetCategory::Expression, "a + 1");
    let expected = "\
import math;

int add(int a, int b) { return a + b; }

void main() {
    int a = 5;
    print(a);
    show(a + 1);
}
";
    assert_eq!(synthesize(&session, &snippet), expected);
}

#[test]
fn synthesis_is_deterministic() {
    let mut session = SessionState::new();
    session.insert_variable("a", Type::Int, "5");
    let snippet = Snippet::new(SnippetCategory::Statement, "print(a);");
    assert_eq!(
        synthesize(&session, &snippet),
        synthesize(&session, &snippet)
    );
}

#[test]
fn new_import_lands_after_existing_imports() {
    let mut session = SessionState::new();
    session.insert_import("math", "import math;");
    let snippet = Snippet::new(SnippetCategory::Import, "import strings;");
    assert_eq!(
        synthesize(&session, &snippet),
        "import math;\nimport strings;\n\nvoid main() {\n}\n"
    );
}

#[test]
fn duplicate_import_is_not_repeated() {
    let mut session = SessionState::new();
    session.insert_import("math", "import math;");
    let snippet = Snippet::new(SnippetCategory::Import, "import math;");
    assert_eq!(
        synthesize(&session, &snippet),
        "import math;\n\nvoid main() {\n}\n"
    );
}

#[test]
fn redefined_function_replaces_the_old_body_in_place() {
    let mut session = SessionState::new();
    session.insert_module_decl("add", "int add(int a, int b) { return a + b; }");
    session.insert_module_decl("sub", "int sub(int a, int b) { return a - b; }");

    let snippet = Snippet::new(
        SnippetCategory::ModuleDeclaration,
        "int add(int a, int b) { return b + a; }",
    );
    let text = synthesize(&session, &snippet);
    assert!(text.contains("return b + a;"));
    assert!(!text.contains("return a + b;"));
    let add_at = text.find("int add").unwrap();
    let sub_at = text.find("int sub").unwrap();
    assert!(add_at < sub_at);
}

#[test]
fn variable_declaration_turn_appends_its_own_line() {
    let mut session = SessionState::new();
    session.insert_variable("a", Type::Int, "5");
    let snippet = Snippet::new(SnippetCategory::VariableDeclaration, "int b = a + 1;");
    assert_eq!(
        synthesize(&session, &snippet),
        "void main() {\n    int a = 5;\n    int b = a + 1;\n}\n"
    );
}

#[test]
fn string_variables_redeclare_with_quoted_literals() {
    let mut session = SessionState::new();
    session.insert_variable("s", Type::Str, "\"hi\\n\"");
    let snippet = Snippet::new(SnippetCategory::Expression, "s");
    let text = synthesize(&session, &snippet);
    assert!(text.contains("    string s = \"hi\\n\";\n"));
}
