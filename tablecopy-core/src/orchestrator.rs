//! Phased extraction run.
//!
//! One run authenticates, builds the table rules, opens the destination,
//! optionally creates schema for every eligible table and then copies their
//! data. Phases run strictly in that order, one table at a time.

use crate::Result;
use crate::config::{ExtractionConfig, TransferFailurePolicy, read_rules_document};
use crate::destination::{DestinationBuilder, DestinationFactory};
use crate::error::{CopyError, redact_descriptor};
use crate::models::{ExtractionSummary, TableOutcome, TransferStatus};
use crate::monitor::{ExtractionMonitor, monitor_for};
use crate::rules::RuleSet;
use crate::security::{ConnectionResolver, CredentialRegistry};
use crate::source::{RemoteService, Session};
use crate::transfer::{copy_table, with_timeout};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Where the table rules of a run come from.
#[derive(Debug, Clone, Default)]
pub enum RuleSource {
    /// Select every table
    #[default]
    Default,
    /// XML rules document
    Document(PathBuf),
    /// Rules built by the caller
    Rules(RuleSet),
}

impl RuleSource {
    /// Builds the rule set for a run.
    ///
    /// # Errors
    /// Returns error if the rules document cannot be read or parsed.
    pub fn build(&self) -> Result<RuleSet> {
        match self {
            Self::Default => Ok(RuleSet::default_rules()),
            Self::Document(path) => read_rules_document(path),
            Self::Rules(rules) => Ok(rules.clone()),
        }
    }
}

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Profile name or `ENVIRONMENT,username,password,token`
    pub connect: String,
    /// Table rules
    pub rules: RuleSource,
}

impl ExtractionRequest {
    /// Creates a request selecting every table.
    pub fn new(connect: impl Into<String>) -> Self {
        Self {
            connect: connect.into(),
            rules: RuleSource::Default,
        }
    }

    /// Sets the rule source.
    pub fn with_rules(mut self, rules: RuleSource) -> Self {
        self.rules = rules;
        self
    }
}

/// Sequences authentication, schema creation and data copy.
pub struct ExtractionOrchestrator {
    config: ExtractionConfig,
    service: Arc<dyn RemoteService>,
    registry: Arc<dyn CredentialRegistry>,
    destinations: Arc<dyn DestinationFactory>,
    monitor: Arc<dyn ExtractionMonitor>,
}

impl std::fmt::Debug for ExtractionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionOrchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ExtractionOrchestrator {
    /// Creates an orchestrator with the stock monitor for `config.silent`.
    pub fn new(
        config: ExtractionConfig,
        service: Arc<dyn RemoteService>,
        registry: Arc<dyn CredentialRegistry>,
        destinations: Arc<dyn DestinationFactory>,
    ) -> Self {
        let monitor = Arc::from(monitor_for(config.silent));
        Self {
            config,
            service,
            registry,
            destinations,
            monitor,
        }
    }

    /// Replaces the monitor.
    pub fn with_monitor(mut self, monitor: Arc<dyn ExtractionMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Run configuration.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Executes one extraction run.
    ///
    /// # Errors
    /// Returns error if:
    /// - The configuration is invalid
    /// - The connection descriptor cannot be resolved or login fails
    /// - The rules document is unreadable or malformed
    /// - The destination cannot be opened
    /// - Any remote call times out before the data phase
    /// - Schema creation fails for any table
    /// - A table copy fails under [`TransferFailurePolicy::Abort`]
    pub async fn run(&self, request: &ExtractionRequest) -> Result<ExtractionSummary> {
        self.config.validate()?;
        let timeout = self.config.timeout;
        let mut summary = ExtractionSummary::start();

        // Authenticate
        if self.config.trace {
            trace!(run_id = %summary.run_id, ">>> Connect to {}", redact_descriptor(&request.connect));
        }
        let credentials = ConnectionResolver::new(self.registry.as_ref()).resolve(&request.connect)?;
        let mut session =
            with_timeout("login", timeout, self.service.login(&credentials)).await?;
        info!(
            "Authenticated to {} as '{}'",
            credentials.environment(),
            credentials.username()
        );
        drop(credentials);

        // Rules
        if self.config.trace {
            trace!(">>> Build table rules");
        }
        let rules = request.rules.build()?;
        debug!(
            "{} include and {} exclude rules",
            rules.include_count(),
            rules.exclude_count()
        );

        // Destination
        if self.config.trace {
            trace!(">>> Open destination");
        }
        let mut destination = self
            .destinations
            .open()
            .await
            .map_err(|e| match e {
                CopyError::DestinationUnavailable { .. } => e,
                other => CopyError::destination_unavailable("Failed to open destination", other),
            })?;

        let tables = with_timeout("list tables", timeout, session.list_tables()).await?;
        let eligible = rules.eligible(&tables);
        info!("{} of {} tables selected", eligible.len(), tables.len());

        if self.config.schema {
            if self.config.trace {
                trace!(">>> Start creation of schema");
            }
            if let Err(error) = self
                .create_schema(session.as_mut(), destination.as_mut(), &eligible)
                .await
            {
                if let Err(e) = destination.finish().await {
                    warn!("Failed to close destination: {}", e);
                }
                return Err(error);
            }
            summary.schema_tables.clone_from(&eligible);
        }

        if self.config.trace {
            trace!(">>> Start copy of data");
        }
        for table in &eligible {
            let result = copy_table(
                session.as_mut(),
                destination.as_mut(),
                table,
                self.config.buffer_bytes(),
                timeout,
                self.monitor.as_ref(),
            )
            .await;

            match result {
                Ok(outcome) => summary.tables.push(outcome),
                Err(error) => {
                    self.monitor
                        .report_message(&format!("Failed to copy {}: {}", table, error));
                    warn!("Copy of {} failed: {}", table, error);

                    match self.config.on_transfer_error {
                        TransferFailurePolicy::Abort => {
                            if let Err(e) = destination.finish().await {
                                warn!("Failed to close destination: {}", e);
                            }
                            return Err(into_transfer(table, error));
                        }
                        TransferFailurePolicy::Continue => summary.tables.push(TableOutcome {
                            table: table.clone(),
                            rows: 0,
                            batches: 0,
                            status: TransferStatus::Failed(error.to_string()),
                        }),
                    }
                }
            }
        }

        destination.finish().await?;
        summary.finished_at = Some(Utc::now());

        if self.config.trace {
            trace!(
                ">>> Copied {} rows from {} tables ({} failed)",
                summary.total_rows(),
                summary.tables.len(),
                summary.failed_count()
            );
        }

        Ok(summary)
    }

    async fn create_schema(
        &self,
        session: &mut dyn Session,
        destination: &mut dyn DestinationBuilder,
        tables: &[String],
    ) -> Result<()> {
        for table in tables {
            self.monitor
                .report_message(&format!("Creating schema for {}", table));
            if let Err(error) = self.create_table_schema(session, destination, table).await {
                let error = into_transfer(table, error);
                self.monitor.report_message(&format!(
                    "Failed to create schema for {}: {}",
                    table, error
                ));
                warn!("Schema creation for {} failed: {}", table, error);
                return Err(error);
            }
        }
        Ok(())
    }

    async fn create_table_schema(
        &self,
        session: &mut dyn Session,
        destination: &mut dyn DestinationBuilder,
        table: &str,
    ) -> Result<()> {
        let description = with_timeout(
            &format!("describe {}", table),
            self.config.timeout,
            session.describe_table(table),
        )
        .await?;
        destination.create_schema_for_table(&description).await
    }
}

fn into_transfer(table: &str, error: CopyError) -> CopyError {
    match error {
        CopyError::Transfer { .. } => error,
        other => CopyError::transfer(table, other.to_string()),
    }
}
