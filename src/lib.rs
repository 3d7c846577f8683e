pub mod backend;
pub mod diagnostics;
pub mod engine;
pub mod language;
pub mod runtime;

pub use engine::{EngineConfig, ReplEngine, SubmitOutcome};

#[cfg(test)]
mod tests;
