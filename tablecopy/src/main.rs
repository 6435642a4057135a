//! Table copy tool.
//!
//! This binary selects tables of a record service with include/exclude
//! rules and copies them into a destination database, optionally creating
//! their schema first.
//!
//! # Security Guarantees
//! - Passwords and security tokens never appear in logs or error messages
//! - Connection descriptors are redacted in trace output

use clap::Parser;
use tablecopy::Cli;
use tablecopy::copy::{run_copy, summary_line};
use tablecopy_core::logging::{init_logging, parse_log_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = parse_log_level(&cli.log)?;
    init_logging(level, cli.trace)?;

    let summary = run_copy(&cli).await?;

    if !cli.silent {
        println!("{}", summary_line(&summary));
    }

    Ok(())
}
