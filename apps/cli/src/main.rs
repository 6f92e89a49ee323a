//! gardenlink CLI: run the garden agent tools from a terminal.
//!
//! Explores wikilinks across gardens, lists and reads garden files, and reads
//! or searches the web through the content proxy.

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
