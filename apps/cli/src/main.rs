//! confdown CLI: Confluence space exporter.
//!
//! Pulls every page of the selected spaces through the cursor-paginated
//! search API and writes them as Markdown files mirroring the page tree.

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
