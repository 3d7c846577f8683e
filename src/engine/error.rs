use crate::backend::{CompileDiagnostic, FailureOrigin};
use crate::language::errors::SyntaxError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Every candidate production was tried and none matched.
    #[error("no valid interpretation for input: {}", error.message)]
    NoMatch { error: SyntaxError },
    /// The shared deadline expired before any candidate matched.
    #[error("classification timed out after {budget:?}")]
    Timeout { budget: Duration },
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error("compilation failed with {} error(s)", diagnostics.len())]
    Compile {
        /// Text of the synthesized program, kept so callers can render
        /// diagnostics against the right source.
        program: String,
        diagnostics: Vec<CompileDiagnostic>,
    },
    #[error("{message}")]
    Runtime {
        origin: FailureOrigin,
        message: String,
    },
    /// Defensive: the execution payload did not contain what reconciliation
    /// needed. The session is left untouched.
    #[error("reconciliation invariant violated: {message}")]
    ReconcileInvariant { message: String },
}

impl TurnError {
    /// Human-readable message distinguishing where the turn failed.
    pub fn user_message(&self) -> String {
        match self {
            TurnError::Classify(error) => format!("error: {error}"),
            TurnError::Compile { diagnostics, .. } => {
                let mut lines = Vec::with_capacity(diagnostics.len());
                for diagnostic in diagnostics {
                    lines.push(format!("compile error: {}", diagnostic.message));
                }
                lines.join("\n")
            }
            TurnError::Runtime { origin, message } => match origin {
                FailureOrigin::Internal => {
                    format!("internal error while loading the program: {message}")
                }
                FailureOrigin::UserCode => format!("runtime error: {message}"),
            },
            TurnError::ReconcileInvariant { message } => {
                format!("internal error: {message}")
            }
        }
    }
}
