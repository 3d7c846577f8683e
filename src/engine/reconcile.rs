use crate::backend::ExecutionResult;
use crate::engine::classify::{Snippet, SnippetCategory};
use crate::engine::error::TurnError;
use crate::engine::session::SessionState;
use crate::language::parser;

/// Folds a successful execution back into the session, or surfaces the
/// failure with the session untouched.
///
/// This is the only place session state is ever mutated, and mutation happens
/// only on the `Success` arm — every failure path returns before touching it,
/// so a failed turn leaves the session byte-for-byte unchanged.
pub fn reconcile(
    session: &mut SessionState,
    snippet: &Snippet,
    program: &str,
    result: ExecutionResult,
) -> Result<String, TurnError> {
    let (stdout, bindings) = match result {
        ExecutionResult::CompileFailure(diagnostics) => {
            return Err(TurnError::Compile {
                program: program.to_string(),
                diagnostics,
            });
        }
        ExecutionResult::RuntimeFailure { origin, message } => {
            return Err(TurnError::Runtime { origin, message });
        }
        ExecutionResult::Success { stdout, bindings } => (stdout, bindings),
    };

    let raw = snippet.source_text.trim();
    match snippet.category {
        SnippetCategory::Import => {
            let path = parser::import_path(raw).ok_or_else(|| TurnError::ReconcileInvariant {
                message: format!("import snippet no longer parses: `{raw}`"),
            })?;
            session.insert_import(path, raw);
        }
        SnippetCategory::ModuleDeclaration => {
            let name =
                parser::declaration_name(raw).ok_or_else(|| TurnError::ReconcileInvariant {
                    message: format!("declaration snippet no longer parses: `{raw}`"),
                })?;
            session.insert_module_decl(name, raw);
        }
        SnippetCategory::VariableDeclaration => {
            let decl =
                parser::variable_declaration(raw).ok_or_else(|| TurnError::ReconcileInvariant {
                    message: format!("variable snippet no longer parses: `{raw}`"),
                })?;
            let binding = bindings
                .iter()
                .find(|binding| binding.name == decl.name.name)
                .ok_or_else(|| TurnError::ReconcileInvariant {
                    message: format!(
                        "execution result has no binding for `{}`",
                        decl.name.name
                    ),
                })?;
            session.insert_variable(&binding.name, binding.ty, binding.value.to_literal());
        }
        SnippetCategory::Statement => {
            session.push_statement(raw);
        }
        SnippetCategory::Expression => {
            // History replays expressions as discard statements; the value was
            // only shown on the turn that introduced it.
            let expr = raw.trim_end_matches(';').trim_end();
            session.push_statement(format!("{expr};"));
        }
    }

    Ok(stdout)
}
