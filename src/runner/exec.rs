//! Scenario execution
//!
//! Runs steps strictly in order. Later steps consume variables extracted by
//! earlier responses, so there is nothing to parallelize; the value of the
//! runner is the threading, not throughput.

use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::scenario::{template, Scenario, Step};

use super::context::{RunContext, ACCESS_TOKEN};
use super::http::{self, PreparedPart, PreparedRequest};
use super::report::{Payload, RunReport, StepOutcome, StepResult};

/// Run a scenario against the configured deployment
///
/// Always yields one result per declared step. A fatal error (network
/// failure, deadline) stops execution; the remaining steps are reported as
/// not executed and the error is carried in the report. `Err` is reserved
/// for failures to start at all.
pub async fn run_scenario(scenario: &Scenario, config: &Config) -> Result<RunReport> {
    config.validate()?;
    let client = http::build_client(Duration::from_secs(config.http.request_timeout_secs))?;

    let mut ctx = RunContext::seeded();
    for (name, value) in &scenario.vars {
        ctx.set_str(name, value);
    }
    // Config vars come last so operators can override scenario seeds,
    // including planting a pre-issued accessToken
    for (name, value) in &config.vars {
        ctx.set_str(name, value);
    }

    let deadline = Instant::now() + Duration::from_secs(config.http.timeout_secs);
    let mut report = RunReport::new(&scenario.name);

    for step in &scenario.steps {
        if report.fatal.is_some() {
            report.results.push(StepResult::unexecuted(
                &step.name,
                step.method.as_str(),
                &step.path,
                StepOutcome::NotExecuted,
            ));
            continue;
        }
        match execute_step(&client, step, &mut ctx, config, deadline).await {
            Ok(result) => report.results.push(result),
            Err(e) => {
                tracing::debug!(step = %step.name, error = %e, "fatal error, aborting run");
                report.results.push(StepResult::unexecuted(
                    &step.name,
                    step.method.as_str(),
                    &step.path,
                    StepOutcome::NotExecuted,
                ));
                report.fatal = Some(e);
            }
        }
    }

    Ok(report)
}

/// Execute a single step against the deployment
async fn execute_step(
    client: &reqwest::Client,
    step: &Step,
    ctx: &mut RunContext,
    config: &Config,
    deadline: Instant,
) -> Result<StepResult> {
    // Resolve prerequisites and render templates. A missing variable here
    // means some earlier step failed to produce it; the step is recorded
    // without ever issuing a request.
    let mut request = match prepare(step, ctx, config) {
        Ok(request) => request,
        Err(missing) => {
            let outcome = if step.optional {
                tracing::debug!(step = %step.name, %missing, "optional step skipped");
                StepOutcome::Skipped { missing }
            } else {
                tracing::warn!(step = %step.name, %missing, "prerequisite missing, step not sent");
                StepOutcome::MissingPrerequisite { missing }
            };
            return Ok(StepResult::unexecuted(
                &step.name,
                step.method.as_str(),
                &step.path,
                outcome,
            ));
        }
    };

    // Multipart file IO is not a prerequisite problem; a missing upload
    // file is an operator mistake that aborts the run
    if let Some(spec) = &step.multipart {
        request.part = Some(PreparedPart::resolve(spec)?);
    }

    let url = request.url.clone();
    tracing::debug!(step = %step.name, method = %request.method, %url, "sending request");

    let remaining = deadline
        .checked_duration_since(Instant::now())
        .ok_or(Error::RunTimeout(config.http.timeout_secs))?;
    let raw = tokio::time::timeout(remaining, http::send(client, request))
        .await
        .map_err(|_| Error::RunTimeout(config.http.timeout_secs))??;

    tracing::debug!(step = %step.name, status = raw.status, "response received");

    // Extraction only looks at successful JSON responses; a miss leaves the
    // variable unset so downstream steps skip instead of sending garbage
    if (200..300).contains(&raw.status) {
        if let Payload::Json(body) = &raw.payload {
            for (name, paths) in &step.extract {
                if ctx.extract(name, paths.candidates(), config.api.envelope, body) {
                    tracing::debug!(step = %step.name, var = %name, "extracted variable");
                } else {
                    tracing::debug!(step = %step.name, var = %name, "extraction paths absent, variable left unset");
                }
            }
        }
    }

    let outcome = if step.passes(raw.status) {
        StepOutcome::Passed
    } else {
        StepOutcome::Failed
    };

    Ok(StepResult {
        name: step.name.clone(),
        method: step.method.to_string(),
        url,
        status: Some(raw.status),
        outcome,
        payload: raw.payload,
    })
}

/// Render a step into a sendable request
///
/// The error is the name of the first missing context variable, whether it
/// came from `requires`, the auth flag or a template placeholder.
fn prepare(
    step: &Step,
    ctx: &RunContext,
    config: &Config,
) -> std::result::Result<PreparedRequest, String> {
    for name in &step.requires {
        if !ctx.contains(name) {
            return Err(name.clone());
        }
    }

    let bearer = if step.auth {
        Some(ctx.access_token().ok_or_else(|| ACCESS_TOKEN.to_string())?)
    } else {
        None
    };

    let lookup = |name: &str| ctx.get(name).cloned();

    let path = template::render_str(&step.path, &lookup)?;
    let url = http::join_url(&config.http.base_url, &path);

    let mut query = Vec::with_capacity(step.query.len());
    for (key, value) in &step.query {
        query.push((key.clone(), template::render_str(value, &lookup)?));
    }

    let body: Option<Value> = match &step.body {
        Some(body) => Some(template::render_value(body, &lookup)?),
        None => None,
    };

    Ok(PreparedRequest {
        method: step.method.clone(),
        url,
        query,
        body,
        part: None,
        bearer,
    })
}
