use crate::backend::CompileDiagnostic;
use crate::engine::error::ClassifyError;
use crate::language::errors::SyntaxError;
use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Process-agnostic sink for debug/warning events and per-operation timings.
///
/// Engine components receive the sink explicitly instead of reaching for
/// ambient global state, so tests can swap in [`NullSink`] without teardown.
pub trait EventSink: Send + Sync {
    fn debug(&self, message: &str);
    fn warning(&self, message: &str);
    fn timing(&self, operation: &str, elapsed: Duration);
}

/// Sink that drops everything. Used by tests and by embedders that do not
/// care about engine telemetry.
pub struct NullSink;

impl EventSink for NullSink {
    fn debug(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn timing(&self, _operation: &str, _elapsed: Duration) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OperationStats {
    pub count: u64,
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl OperationStats {
    fn record(&mut self, elapsed: Duration) {
        if self.count == 0 {
            self.min = elapsed;
            self.max = elapsed;
        } else {
            self.min = self.min.min(elapsed);
            self.max = self.max.max(elapsed);
        }
        self.count += 1;
        self.total += elapsed;
    }

    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total / self.count as u32
        }
    }
}

/// Default sink for a session: forwards messages to `tracing` and aggregates
/// duration statistics keyed by operation name. Readers get a consistent
/// snapshot even while a turn is recording on another thread.
#[derive(Default)]
pub struct SessionDiagnostics {
    stats: Mutex<HashMap<String, OperationStats>>,
}

impl SessionDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<(String, OperationStats)> {
        let stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<_> = stats
            .iter()
            .map(|(name, stats)| (name.clone(), *stats))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Logs a closing summary of every timed operation.
    pub fn flush(&self) {
        for (operation, stats) in self.snapshot() {
            tracing::info!(
                operation = %operation,
                count = stats.count,
                mean_us = stats.mean().as_micros() as u64,
                max_us = stats.max.as_micros() as u64,
                "operation timing summary"
            );
        }
    }
}

impl EventSink for SessionDiagnostics {
    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn timing(&self, operation: &str, elapsed: Duration) {
        tracing::trace!(operation, elapsed_us = elapsed.as_micros() as u64, "timed");
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.entry(operation.to_string()).or_default().record(elapsed);
    }
}

/// Runs `f`, reporting its wall-clock duration to the sink under `operation`.
pub fn time_operation<T>(sink: &dyn EventSink, operation: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = f();
    sink.timing(operation, start.elapsed());
    result
}

/// Monotonic cutoff shared by all parse attempts of one classification.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    end: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            end: Instant::now() + budget,
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.end
    }
}

#[derive(Debug, Error, Diagnostic, Clone)]
#[error("{message}")]
pub struct SnippetDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("{message}")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    message: String,
}

impl SnippetDiagnostic {
    pub fn from_error(src: NamedSource<String>, err: &SyntaxError) -> Self {
        Self {
            src,
            span: err.to_source_span(),
            help: err.help.clone(),
            message: err.message.clone(),
        }
    }
}

pub fn emit_classify_error(raw: &str, error: &ClassifyError) {
    match error {
        ClassifyError::NoMatch { error } => {
            let src = NamedSource::new("repl input", raw.to_string());
            let diagnostic = SnippetDiagnostic::from_error(src, error);
            eprintln!("{:?}", Report::new(diagnostic));
        }
        ClassifyError::Timeout { .. } => {
            eprintln!("{error}");
        }
    }
}

pub fn emit_compile_failure(program: &str, diagnostics: &[CompileDiagnostic]) {
    let src = NamedSource::new("synthesized program", program.to_string());
    for diagnostic in diagnostics {
        let rendered = SnippetDiagnostic {
            src: src.clone(),
            span: (diagnostic.span.start, diagnostic.span.len()).into(),
            help: None,
            message: diagnostic.message.clone(),
        };
        eprintln!("{:?}", Report::new(rendered));
    }
}
