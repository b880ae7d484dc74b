//! CLI command handling
//!
//! Dispatches CLI commands and renders the per-step report. The report goes
//! to stdout; everything else (tracing) goes to stderr.

use colored::Colorize;
use std::path::Path;

use crate::commands::Commands;
use crate::common::config::{Config, Envelope};
use crate::common::{Error, Result};
use crate::runner::{self, Payload, RunReport, StepOutcome, StepResult};
use crate::scenario::{builtin, template, Expect, Scenario, Step};

/// Dispatch a CLI command
///
/// Returns whether the process should exit zero. A run with failed steps is
/// `Ok(false)`: the command itself worked, the deployment did not.
pub async fn dispatch(command: Commands) -> Result<bool> {
    match command {
        Commands::Run {
            scenario,
            base_url,
            timeout_secs,
            envelope,
            vars,
            verbose,
        } => {
            let mut config = Config::load()?;
            apply_overrides(&mut config, base_url, timeout_secs, envelope, vars)?;
            let scenario = resolve_scenario(&scenario)?;

            println!(
                "\n{} {}",
                "Running scenario:".blue().bold(),
                scenario.name.white().bold()
            );
            if let Some(desc) = &scenario.description {
                println!("  {}", desc.dimmed());
            }
            println!("  {}", format!("target: {}", config.http.base_url).dimmed());

            let report = runner::run_scenario(&scenario, &config).await?;
            print_report(&scenario, &report, &config, verbose);

            Ok(report.success())
        }

        Commands::List => {
            println!("{}", "Built-in scenarios:".blue().bold());
            for builtin in builtin::BUILTINS {
                println!(
                    "  {:<12} {}",
                    builtin.name.white().bold(),
                    builtin.summary.dimmed()
                );
            }
            Ok(true)
        }

        Commands::Show { scenario } => {
            let scenario = resolve_scenario(&scenario)?;
            print_scenario(&scenario);
            Ok(true)
        }
    }
}

/// Fold CLI flags into the loaded configuration
fn apply_overrides(
    config: &mut Config,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    envelope: Option<Envelope>,
    vars: Vec<String>,
) -> Result<()> {
    if let Some(base_url) = base_url {
        config.http.base_url = base_url;
    }
    if let Some(timeout_secs) = timeout_secs {
        config.http.timeout_secs = timeout_secs;
    }
    if let Some(envelope) = envelope {
        config.api.envelope = envelope;
    }
    for raw in vars {
        let (key, value) = Config::parse_var(&raw)?;
        config.vars.insert(key, value);
    }
    config.validate()
}

/// Look up a built-in by name, then fall back to a file path
fn resolve_scenario(name: &str) -> Result<Scenario> {
    if let Some(builtin) = builtin::get(name) {
        return builtin.load();
    }
    let path = Path::new(name);
    if path.exists() {
        return Scenario::from_file(path);
    }
    Err(Error::ScenarioNotFound(name.to_string()))
}

fn print_report(scenario: &Scenario, report: &RunReport, config: &Config, verbose: bool) {
    println!("\n{}", "Steps:".cyan());
    for (index, (step, result)) in scenario.steps.iter().zip(&report.results).enumerate() {
        print_step(index + 1, step, result, config, verbose);
    }

    if let Some(fatal) = &report.fatal {
        println!("\n  {} {}", "✗".red().bold(), format!("Run aborted: {fatal}").red());
    }

    println!(
        "\nSummary: {} passed, {} failed, {} skipped, {} not executed",
        report.passed(),
        report.failed(),
        report.skipped(),
        report.not_executed()
    );

    if report.success() {
        println!("\n{} {}\n", "✓".green().bold(), "Scenario passed".green().bold());
    } else {
        println!("\n{} {}\n", "✗".red().bold(), "Scenario failed".red().bold());
    }
}

fn print_step(num: usize, step: &Step, result: &StepResult, config: &Config, verbose: bool) {
    let target = format!(
        "{} {}",
        result.method,
        display_path(&result.url, &config.http.base_url)
    );
    match &result.outcome {
        StepOutcome::Passed => {
            let status = result.status.unwrap_or_default();
            println!(
                "  {} {:>2} {:<28} {} ({})",
                "✓".green(),
                num,
                result.name,
                target.dimmed(),
                status
            );
        }
        StepOutcome::Failed => {
            let status = result.status.unwrap_or_default();
            println!(
                "  {} {:>2} {:<28} {} ({}, expected {})",
                "✗".red(),
                num,
                result.name,
                target.dimmed(),
                status.to_string().red(),
                expect_label(step)
            );
        }
        StepOutcome::Skipped { missing } => {
            println!(
                "  {} {:>2} {:<28} {}",
                "-".yellow(),
                num,
                result.name,
                format!("skipped, no {missing}").dimmed()
            );
        }
        StepOutcome::MissingPrerequisite { missing } => {
            println!(
                "  {} {:>2} {:<28} {}",
                "!".yellow().bold(),
                num,
                result.name,
                format!("missing prerequisite: {missing}").yellow()
            );
        }
        StepOutcome::NotExecuted => {
            println!(
                "  {} {:>2} {:<28} {}",
                "·".dimmed(),
                num,
                result.name,
                "not executed".dimmed()
            );
        }
    }

    if verbose && result.outcome.executed() {
        print_payload(&result.payload);
    }
}

fn print_payload(payload: &Payload) {
    match payload {
        Payload::Json(value) => {
            let pretty = serde_json::to_string_pretty(value).unwrap_or_default();
            for line in pretty.lines() {
                println!("        {}", line.dimmed());
            }
        }
        Payload::Text(text) => {
            let shown = text.get(..400).unwrap_or(text);
            for line in shown.lines() {
                println!("        {}", line.dimmed());
            }
        }
        Payload::Empty => {}
    }
}

fn print_scenario(scenario: &Scenario) {
    println!(
        "\n{} {}",
        "Scenario:".blue().bold(),
        scenario.name.white().bold()
    );
    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }
    if !scenario.vars.is_empty() {
        let vars: Vec<&str> = scenario.vars.keys().map(String::as_str).collect();
        println!("  {}", format!("vars: {}", vars.join(", ")).dimmed());
    }
    println!();
    for (index, step) in scenario.steps.iter().enumerate() {
        let mut notes = Vec::new();
        if step.auth {
            notes.push("auth".to_string());
        }
        if step.optional {
            notes.push("optional".to_string());
        }
        let needs = step_needs(step);
        if !needs.is_empty() {
            notes.push(format!("needs {}", needs.join(", ")));
        }
        if !step.extract.is_empty() {
            let extracted: Vec<&str> = step.extract.keys().map(String::as_str).collect();
            notes.push(format!("extracts {}", extracted.join(", ")));
        }
        let suffix = if notes.is_empty() {
            String::new()
        } else {
            format!("  [{}]", notes.join("; "))
        };
        println!(
            "  {:>2} {:<6} {:<36} -> {}{}",
            index + 1,
            step.method.as_str(),
            step.path,
            expect_label(step),
            suffix.dimmed()
        );
    }
    println!();
}

/// Variables a step consumes, from requires and every template
fn step_needs(step: &Step) -> Vec<String> {
    let mut needs: Vec<String> = Vec::new();
    let mut push = |name: String| {
        if !needs.contains(&name) {
            needs.push(name);
        }
    };
    for name in &step.requires {
        push(name.clone());
    }
    for name in template::scan(&step.path) {
        push(name);
    }
    for value in step.query.values() {
        for name in template::scan(value) {
            push(name);
        }
    }
    if let Some(body) = &step.body {
        for name in template::scan_value(body) {
            push(name);
        }
    }
    needs
}

fn expect_label(step: &Step) -> String {
    match &step.expect {
        None => "2xx".to_string(),
        Some(Expect::Code(code)) => code.to_string(),
        Some(Expect::AnyOf(codes)) => codes
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(" or "),
    }
}

/// Show the path relative to the base URL where possible
fn display_path(url: &str, base: &str) -> String {
    url.strip_prefix(base.trim_end_matches('/'))
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_scenario_prefers_builtins() {
        let scenario = resolve_scenario("auth").unwrap();
        assert_eq!(scenario.name, "auth");
    }

    #[test]
    fn test_resolve_scenario_unknown_name() {
        assert!(matches!(
            resolve_scenario("definitely-not-a-scenario"),
            Err(Error::ScenarioNotFound(_))
        ));
    }

    #[test]
    fn test_step_needs_collects_all_sources() {
        let scenario = Scenario::from_yaml(
            r#"
            name: needs
            steps:
              - name: reply
                method: POST
                path: "/comments/{{commentId}}/replies"
                requires: [docId]
                query:
                  page: "{{page}}"
                body:
                  content: "re: {{title}}"
            "#,
        )
        .unwrap();
        let needs = step_needs(&scenario.steps[0]);
        assert_eq!(needs, vec!["docId", "commentId", "page", "title"]);
    }

    #[test]
    fn test_display_path_strips_base() {
        assert_eq!(
            display_path("http://localhost:8080/api/users/me", "http://localhost:8080/api"),
            "/users/me"
        );
        // Unrendered templates are shown as-is
        assert_eq!(
            display_path("/documents/{{docId}}", "http://localhost:8080/api"),
            "/documents/{{docId}}"
        );
    }
}
