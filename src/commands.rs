//! CLI command definitions
//!
//! Defines the clap commands for the smoke-test runner.

use clap::Subcommand;

use crate::common::config::Envelope;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario against a deployment
    Run {
        /// Built-in scenario name or path to a YAML scenario file
        #[arg(default_value = "full")]
        scenario: String,

        /// Base URL of the API under test (e.g. http://localhost:8080/api)
        #[arg(long)]
        base_url: Option<String>,

        /// Overall run deadline in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Where response payloads live relative to the JSON root
        #[arg(long, value_enum)]
        envelope: Option<Envelope>,

        /// Extra context variables, e.g. --var communityTagId=7
        /// Can be specified multiple times; overrides scenario vars
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,

        /// Print response bodies for every executed step
        #[arg(long, short)]
        verbose: bool,
    },

    /// List built-in scenarios
    List,

    /// Print a scenario's steps without running anything
    Show {
        /// Built-in scenario name or path to a YAML scenario file
        scenario: String,
    },
}
