//! smokerun - API smoke-test scenario runner
//!
//! Runs declarative HTTP scenarios against a deployed document-service API
//! and reports a per-step verdict.

use clap::Parser;
use smokerun::{cli, commands, common};

use commands::Commands;

#[derive(Parser)]
#[command(name = "smokerun", about = "API smoke-test scenario runner")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    common::logging::init();

    let cli = Cli::parse();

    match cli::dispatch(cli.command).await {
        // The command worked but the scenario had failing steps
        Ok(false) => std::process::exit(1),
        Ok(true) => {}
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}
