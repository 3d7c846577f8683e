use crate::engine::classify::{Snippet, SnippetCategory};
use crate::engine::session::SessionState;
use crate::language::parser;

/// Folds a new snippet into the session's accumulated state, producing a
/// complete program ready to compile.
///
/// Pure and deterministic: identical inputs yield byte-identical text, with a
/// fixed template of imports, module declarations, and a `void main()` body
/// that re-declares every known variable, replays statement history verbatim,
/// and ends with the new snippet's line.
pub fn synthesize(session: &SessionState, snippet: &Snippet) -> String {
    let mut text = String::new();
    let raw = snippet.source_text.trim();

    let mut wrote_header = false;

    for entry in session.imports() {
        push_line(&mut text, entry.text.trim());
        wrote_header = true;
    }
    if snippet.category == SnippetCategory::Import {
        let path = parser::import_path(raw);
        let already = path.as_deref().map(|p| session.has_import(p)).unwrap_or(false);
        if !already {
            push_line(&mut text, raw);
            wrote_header = true;
        }
    }

    let new_decl_name = if snippet.category == SnippetCategory::ModuleDeclaration {
        parser::declaration_name(raw)
    } else {
        None
    };
    let mut replaced_decl = false;
    for entry in session.module_decls() {
        if wrote_header {
            text.push('\n');
        }
        if Some(entry.name.as_str()) == new_decl_name.as_deref() {
            // Redefinition keeps the declaration's original position.
            push_line(&mut text, raw);
            replaced_decl = true;
        } else {
            push_line(&mut text, entry.text.trim());
        }
        wrote_header = true;
    }
    if new_decl_name.is_some() && !replaced_decl {
        if wrote_header {
            text.push('\n');
        }
        push_line(&mut text, raw);
        wrote_header = true;
    }

    if wrote_header {
        text.push('\n');
    }
    text.push_str("void main() {\n");
    for entry in session.variables() {
        push_line(
            &mut text,
            &format!("    {} {} = {};", entry.ty, entry.name, entry.value),
        );
    }
    for statement in session.statements() {
        push_line(&mut text, &format!("    {statement}"));
    }
    match snippet.category {
        SnippetCategory::VariableDeclaration | SnippetCategory::Statement => {
            push_line(&mut text, &format!("    {raw}"));
        }
        SnippetCategory::Expression => {
            push_line(&mut text, &format!("    show({});", strip_trailing_semi(raw)));
        }
        SnippetCategory::Import | SnippetCategory::ModuleDeclaration => {}
    }
    text.push_str("}\n");
    text
}

fn push_line(text: &mut String, line: &str) {
    text.push_str(line);
    text.push('\n');
}

fn strip_trailing_semi(raw: &str) -> &str {
    raw.trim().trim_end_matches(';').trim_end()
}
