//! docshelf CLI — documentation importer and server.
//!
//! Pulls documentation from configured sources into a local database and
//! serves it as rendered HTML.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::run(cli).await
}
