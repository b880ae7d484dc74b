//! smokerun - API smoke-test scenario runner
//!
//! This library runs declarative HTTP scenarios against a document-service
//! API: ordered steps, value extraction between them, and a per-step report.

pub mod cli;
pub mod commands;
pub mod common;
pub mod mockapi;
pub mod runner;
pub mod scenario;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use runner::{run_scenario, RunReport, StepOutcome};
pub use scenario::Scenario;
