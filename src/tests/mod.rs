mod backend;
mod classify;
mod engine;
mod session;
mod synthesize;
