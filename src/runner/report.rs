//! Run report types
//!
//! A run produces exactly one [`StepResult`] per declared step, in scenario
//! order, whether or not the step ever issued a request. The report is what
//! the CLI prints and what the process exit code is derived from.

use serde_json::Value;

use crate::common::Error;

/// Response payload captured for a step
#[derive(Debug, Clone)]
pub enum Payload {
    /// Body parsed as JSON
    Json(Value),
    /// Body that was not valid JSON, kept as raw text
    Text(String),
    /// No body, or the step never sent a request
    Empty,
}

impl Payload {
    /// The parsed JSON body, if there is one
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Outcome of a single step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Executed and the status matched the expectation
    Passed,
    /// Executed but the status fell outside the expected set
    Failed,
    /// Optional step whose prerequisite was absent; not an error
    Skipped { missing: String },
    /// Required variable absent; the request was never sent
    MissingPrerequisite { missing: String },
    /// A fatal error stopped the run before this step could execute
    NotExecuted,
}

impl StepOutcome {
    /// Whether the step actually issued a request
    pub fn executed(&self) -> bool {
        matches!(self, StepOutcome::Passed | StepOutcome::Failed)
    }
}

/// Result of one step
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Step name from the scenario
    pub name: String,
    /// HTTP method as text
    pub method: String,
    /// Rendered request URL, or the raw path template when never rendered
    pub url: String,
    /// Response status, when a response arrived
    pub status: Option<u16>,
    /// What happened
    pub outcome: StepOutcome,
    /// Captured response body
    pub payload: Payload,
}

impl StepResult {
    /// Result for a step that never issued a request
    pub fn unexecuted(name: &str, method: &str, path: &str, outcome: StepOutcome) -> Self {
        Self {
            name: name.to_string(),
            method: method.to_string(),
            url: path.to_string(),
            status: None,
            outcome,
            payload: Payload::Empty,
        }
    }
}

/// Full report for one scenario run
#[derive(Debug)]
pub struct RunReport {
    /// Scenario name
    pub scenario: String,
    /// One result per declared step, in scenario order
    pub results: Vec<StepResult>,
    /// Fatal error that aborted the run partway through, if any
    pub fatal: Option<Error>,
}

impl RunReport {
    pub fn new(scenario: &str) -> Self {
        Self {
            scenario: scenario.to_string(),
            results: Vec::new(),
            fatal: None,
        }
    }

    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Failed))
    }

    /// Steps that did not run because a prerequisite was absent
    pub fn skipped(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                StepOutcome::Skipped { .. } | StepOutcome::MissingPrerequisite { .. }
            )
        })
    }

    pub fn not_executed(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::NotExecuted))
    }

    /// Whether the run as a whole succeeded: no fatal error and every step
    /// that actually executed passed its expectation. Skipped steps are
    /// neutral.
    pub fn success(&self) -> bool {
        self.fatal.is_none() && self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&StepOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(outcome: StepOutcome) -> StepResult {
        StepResult {
            name: "step".to_string(),
            method: "GET".to_string(),
            url: "http://localhost/x".to_string(),
            status: outcome.executed().then_some(200),
            outcome,
            payload: Payload::Empty,
        }
    }

    #[test]
    fn test_success_ignores_skips() {
        let mut report = RunReport::new("demo");
        report.results.push(result(StepOutcome::Passed));
        report.results.push(result(StepOutcome::Skipped {
            missing: "commentId".to_string(),
        }));
        report.results.push(result(StepOutcome::MissingPrerequisite {
            missing: "accessToken".to_string(),
        }));
        assert_eq!(report.passed(), 1);
        assert_eq!(report.skipped(), 2);
        assert!(report.success());
    }

    #[test]
    fn test_any_failed_step_fails_the_run() {
        let mut report = RunReport::new("demo");
        report.results.push(result(StepOutcome::Passed));
        report.results.push(result(StepOutcome::Failed));
        assert!(!report.success());
    }

    #[test]
    fn test_fatal_error_fails_the_run() {
        let mut report = RunReport::new("demo");
        report.results.push(result(StepOutcome::Passed));
        report.results.push(result(StepOutcome::NotExecuted));
        report.fatal = Some(Error::RunTimeout(120));
        assert_eq!(report.not_executed(), 1);
        assert!(!report.success());
    }
}
