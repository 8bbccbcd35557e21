//! Argo command-line tool.
//!
//! Runs export and translate operations against a JSON store snapshot:
//!
//!   argo --store store.json export --entity-type node --uuid <uuid>
//!   argo --store store.json translate --entity-type node --uuid <uuid> --payload de.json --write
//!
//! Output is pretty-printed JSON on stdout; logs go to stderr.

use anyhow::Result;
use argo_cli::{Cli, run};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let output = run(&cli)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
