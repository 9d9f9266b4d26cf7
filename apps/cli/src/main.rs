//! TenderScout CLI: crawl a procurement listing page and collect recent
//! tender documents.
//!
//! Downloads matching documents into a local directory and records them in a
//! JSON manifest.

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
