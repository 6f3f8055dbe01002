//! Pathweaver CLI — learning plan generator.
//!
//! Turns a free-text topic into a structured learning tree populated with
//! resources gathered from the web.

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
