pub mod classify;
pub mod error;
pub mod reconcile;
pub mod session;
pub mod synthesize;

pub use classify::{classify, Snippet, SnippetCategory};
pub use error::{ClassifyError, TurnError};
pub use reconcile::reconcile;
pub use session::SessionState;
pub use synthesize::synthesize;

use std::sync::Arc;
use std::time::Duration;

use crate::backend;
use crate::diagnostics::{time_operation, EventSink, SessionDiagnostics};

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Wall-clock budget for the whole classification pass.
    pub classify_budget: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            classify_budget: Duration::from_millis(100),
        }
    }
}

/// What a turn produced, flattened for interactive front ends that only
/// need text plus a pass/fail flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub output: String,
    pub success: bool,
}

/// The interactive session driver.
///
/// Each turn classifies the raw snippet, synthesizes a complete program from
/// the accumulated session plus the new snippet, runs it through the backend,
/// and reconciles the result. Session state only changes when the whole turn
/// succeeds, so a failed turn can simply be retried or abandoned.
pub struct ReplEngine {
    config: EngineConfig,
    session: SessionState,
    sink: Arc<dyn EventSink>,
}

impl Default for ReplEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default(), Arc::new(SessionDiagnostics::new()))
    }
}

impl ReplEngine {
    pub fn new(config: EngineConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            session: SessionState::default(),
            sink,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Runs one turn and returns the captured stdout on success.
    pub fn submit_turn(&mut self, raw: &str) -> Result<String, TurnError> {
        let sink = Arc::clone(&self.sink);
        time_operation(sink.as_ref(), "engine.turn", || {
            let snippet = time_operation(sink.as_ref(), "engine.classify", || {
                classify(raw, self.config.classify_budget)
            })?;
            sink.debug(&format!("classified snippet as {}", snippet.category));

            let program = time_operation(sink.as_ref(), "engine.synthesize", || {
                synthesize(&self.session, &snippet)
            });

            let result = backend::run(&program, sink.as_ref());
            reconcile(&mut self.session, &snippet, &program, result)
        })
    }

    /// Like [`submit_turn`](Self::submit_turn) but never fails: errors come
    /// back as their user-facing rendering with `success` cleared.
    pub fn submit(&mut self, raw: &str) -> SubmitOutcome {
        match self.submit_turn(raw) {
            Ok(output) => SubmitOutcome {
                output,
                success: true,
            },
            Err(error) => SubmitOutcome {
                output: error.user_message(),
                success: false,
            },
        }
    }
}
