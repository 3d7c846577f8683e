use crate::diagnostics::{EventSink, time_operation};
use crate::language::{ast, parser, span::Span, typecheck, types::Type};
use crate::runtime::{interpreter, output::OutputHandle, value::Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Debug)]
pub struct CompileDiagnostic {
    pub message: String,
    pub span: Span,
    pub severity: Severity,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureOrigin {
    /// The toolchain itself misbehaved (load phase); not the user's fault.
    Internal,
    /// The user's own code failed while running.
    UserCode,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub name: String,
    pub ty: Type,
    pub value: Value,
}

#[derive(Debug)]
pub enum ExecutionResult {
    CompileFailure(Vec<CompileDiagnostic>),
    RuntimeFailure {
        origin: FailureOrigin,
        message: String,
    },
    Success {
        stdout: String,
        bindings: Vec<Binding>,
    },
}

pub struct CompiledUnit {
    program: ast::Program,
    warnings: Vec<CompileDiagnostic>,
}

impl CompiledUnit {
    pub fn warnings(&self) -> &[CompileDiagnostic] {
        &self.warnings
    }
}

struct Executable<'a> {
    program: &'a ast::Program,
    entry: &'a ast::FunctionDef,
}

/// Compiles, loads and invokes a synthesized program in a fresh unit.
///
/// No artifact state survives across calls; a failed run leaves nothing
/// behind, which is what makes session rollback a no-op.
pub fn run(source: &str, sink: &dyn EventSink) -> ExecutionResult {
    let unit = match time_operation(sink, "backend.compile", || compile(source)) {
        Ok(unit) => unit,
        Err(diagnostics) => {
            sink.debug(&format!(
                "compilation failed with {} diagnostic(s)",
                diagnostics.len()
            ));
            return ExecutionResult::CompileFailure(diagnostics);
        }
    };
    for warning in unit.warnings() {
        sink.warning(&warning.message);
    }

    let executable = match load(&unit) {
        Ok(executable) => executable,
        Err(message) => {
            sink.warning(&format!("load phase failed: {message}"));
            return ExecutionResult::RuntimeFailure {
                origin: FailureOrigin::Internal,
                message,
            };
        }
    };

    time_operation(sink, "backend.invoke", || invoke(&executable))
}

/// Translates program text into a checked unit, or the list of diagnostics
/// that stopped it.
pub fn compile(source: &str) -> Result<CompiledUnit, Vec<CompileDiagnostic>> {
    let program = parser::parse_program(source).map_err(|errors| {
        errors
            .errors
            .into_iter()
            .map(|error| CompileDiagnostic {
                message: error.message,
                span: error.span,
                severity: Severity::Error,
            })
            .collect::<Vec<_>>()
    })?;

    let warnings = typecheck::check_program(&program).map_err(|errors| {
        errors
            .into_iter()
            .map(|error| CompileDiagnostic {
                message: error.message,
                span: error.span,
                severity: Severity::Error,
            })
            .collect::<Vec<_>>()
    })?;

    Ok(CompiledUnit {
        program,
        warnings: warnings
            .into_iter()
            .map(|warning| CompileDiagnostic {
                message: warning.message,
                span: warning.span,
                severity: Severity::Warning,
            })
            .collect(),
    })
}

fn load(unit: &CompiledUnit) -> Result<Executable<'_>, String> {
    let entry = unit
        .program
        .functions
        .iter()
        .find(|function| function.name.name == "main")
        .ok_or_else(|| "compiled unit has no `main` entry point".to_string())?;
    if !entry.params.is_empty() {
        return Err("entry point `main` must not take parameters".to_string());
    }
    if entry.ret.ty != Type::Unit {
        return Err("entry point `main` must return `void`".to_string());
    }
    Ok(Executable {
        program: &unit.program,
        entry,
    })
}

fn invoke(executable: &Executable<'_>) -> ExecutionResult {
    let handle = OutputHandle::stdout();
    let guard = handle.capture();
    let outcome = interpreter::run_entry(executable.program, executable.entry, &handle);
    let stdout = normalize_newlines(&guard.contents());
    drop(guard);

    match outcome {
        Ok(values) => ExecutionResult::Success {
            stdout,
            bindings: values
                .into_iter()
                .map(|(name, value)| Binding {
                    name,
                    ty: value.type_of(),
                    value,
                })
                .collect(),
        },
        Err(error) => ExecutionResult::RuntimeFailure {
            origin: FailureOrigin::UserCode,
            message: error.to_string(),
        },
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}
