//! confluence-bridge CLI.
//!
//! Runs the bridge tools (CQL search, page read, page update) from the
//! command line and prints their JSON results to stdout.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
