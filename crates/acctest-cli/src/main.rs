mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            suite,
            cases,
            concurrency,
            confirm_attempts,
            poll_interval,
            output,
            backend,
        } => {
            commands::run(suite, cases, concurrency, confirm_attempts, poll_interval, output, backend)
                .await
        }
        Command::Render { fixture, ri, location } => commands::render(fixture, ri, location),
        Command::List => commands::list(),
        Command::CheckDestroy { resource_group, name, backend } => {
            commands::check_destroy(resource_group, name, backend).await
        }
    }
}
