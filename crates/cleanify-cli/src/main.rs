//! `cleanify` command-line client.
//!
//! Settings come from the environment (a `.env` file is honoured); flags
//! override them. The session is stored in a JSON file between runs.

mod commands;
mod handler;
mod output;

use clap::Parser;
use cleanify_client::ClientError;
use commands::Cli;

#[tokio::main]
async fn main() {
    // Load .env if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cleanify=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = handler::run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ClientError>()
        .map(ClientError::exit_code)
        .unwrap_or(1)
}
