//! Run wiring: credential registry, snapshot service, destination and
//! orchestrator.

use crate::Cli;
use anyhow::{Context, Result};
use std::sync::Arc;
use tablecopy_core::{
    DestinationUrl, ExtractionOrchestrator, ExtractionSummary, ProfileRegistry, SnapshotService,
};
use tracing::{debug, info};

/// Loads the credential registry named by `--profiles`, or an empty one.
///
/// # Errors
/// Returns error if the profiles file cannot be read or parsed
pub fn load_registry(cli: &Cli) -> Result<ProfileRegistry> {
    match &cli.profiles {
        Some(path) => {
            let registry = ProfileRegistry::from_file(path).with_context(|| {
                format!("Failed to load connection profiles from {}", path.display())
            })?;
            debug!("Loaded {} connection profiles", registry.len());
            Ok(registry)
        }
        None => Ok(ProfileRegistry::new()),
    }
}

/// Executes one copy run as configured by the CLI flags.
///
/// # Errors
/// Returns error if the configuration is invalid or the run fails
pub async fn run_copy(cli: &Cli) -> Result<ExtractionSummary> {
    let config = cli.extraction_config();
    config.validate().context("Invalid run configuration")?;

    let registry = load_registry(cli)?;
    let service = SnapshotService::new(&cli.source);
    let destination = DestinationUrl::new(&cli.destination);

    info!("Source snapshot: {}", service.root().display());
    info!("Destination: {}", destination.as_str());

    let orchestrator = ExtractionOrchestrator::new(
        config,
        Arc::new(service),
        Arc::new(registry),
        Arc::new(destination),
    );

    let summary = orchestrator
        .run(&cli.request())
        .await
        .context("Copy failed")?;

    info!(
        "Run {} finished: {} rows, {} failed tables",
        summary.run_id,
        summary.total_rows(),
        summary.failed_count()
    );
    Ok(summary)
}

/// One-line summary printed on success.
pub fn summary_line(summary: &ExtractionSummary) -> String {
    let mut line = format!(
        "Copied {} rows from {} tables",
        summary.total_rows(),
        summary.tables.len()
    );
    if !summary.schema_tables.is_empty() {
        line.push_str(&format!(
            ", created schema for {} tables",
            summary.schema_tables.len()
        ));
    }
    let failed = summary.failed_count();
    if failed > 0 {
        line.push_str(&format!(" ({} failed)", failed));
    }
    line
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tablecopy_core::{TableOutcome, TransferStatus};

    fn outcome(table: &str, rows: u64, status: TransferStatus) -> TableOutcome {
        TableOutcome {
            table: table.to_string(),
            rows,
            batches: 1,
            status,
        }
    }

    #[test]
    fn test_summary_line() {
        let mut summary = ExtractionSummary::start();
        summary.tables.push(outcome("Account", 10, TransferStatus::Copied));
        summary.tables.push(outcome("Contact", 5, TransferStatus::Copied));
        assert_eq!(summary_line(&summary), "Copied 15 rows from 2 tables");

        summary.schema_tables = vec!["Account".to_string(), "Contact".to_string()];
        summary.tables.push(outcome(
            "Lead",
            0,
            TransferStatus::Failed("boom".to_string()),
        ));
        assert_eq!(
            summary_line(&summary),
            "Copied 15 rows from 3 tables, created schema for 2 tables (1 failed)"
        );
    }

    #[test]
    fn test_load_registry_missing_file() {
        use clap::Parser;

        let cli = Cli::try_parse_from([
            "tablecopy",
            "--connect",
            "prod",
            "--source",
            "s",
            "--destination",
            "copy.db",
            "--profiles",
            "/nonexistent/profiles.json",
        ])
        .unwrap();
        let error = load_registry(&cli).unwrap_err();
        assert!(format!("{:#}", error).contains("/nonexistent/profiles.json"));
    }
}
