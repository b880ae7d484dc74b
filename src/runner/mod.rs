//! Scenario runner
//!
//! Executes the steps of a loaded scenario strictly in order against one
//! deployment, threading extracted response values through a per-run
//! context, and produces a report with one outcome per declared step.

mod context;
mod exec;
mod http;
mod report;

pub use context::{json_path, Identity, RunContext, ACCESS_TOKEN};
pub use exec::run_scenario;
pub use http::join_url;
pub use report::{Payload, RunReport, StepOutcome, StepResult};
