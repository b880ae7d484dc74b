//! Mock document-service API binary for local runs
//!
//! Serves the same routes as the real backend with in-memory state, so
//! scenarios can be exercised without a deployment.

use clap::Parser;
use smokerun::mockapi::{self, MockApi};

#[derive(Parser)]
#[command(name = "mock-api", about = "In-memory document-service API")]
#[command(version, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,
}

#[tokio::main]
async fn main() {
    smokerun::common::logging::init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.bind, args.port);

    let api = MockApi::new();
    let app = mockapi::router(api);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error: failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    println!("mock-api listening on http://{addr}/api");

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
