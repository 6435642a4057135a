//! Library module for tablecopy
//!
//! This module exposes the CLI definition and run wiring for testing
//! purposes. The binary entry point is in main.rs.

pub mod copy;

use clap::Parser;
use std::path::PathBuf;
use tablecopy_core::config::{DEFAULT_BUFFER_MB, DEFAULT_TIMEOUT_MS};
use tablecopy_core::logging::DEFAULT_LOG_LEVEL;
use tablecopy_core::{ExtractionConfig, ExtractionRequest, RuleSource, TransferFailurePolicy};

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "tablecopy")]
#[command(about = "Copy selected tables from a record service into a destination database")]
#[command(version)]
#[command(long_about = "
tablecopy - Copy selected tables into a destination database

Connects to the record service, selects tables with include/exclude rules,
optionally creates their schema in the destination and then copies their data.

CONNECTION:
  --connect takes a profile name from the --profiles registry, or a literal
  ENVIRONMENT,username,password,token where ENVIRONMENT is PRODUCTION or SANDBOX.

RULES DOCUMENT:
  <copy>
    <include table=\".*\"/>
    <exclude table=\".*History\"/>
  </copy>

EXAMPLES:
  tablecopy --connect prod --profiles profiles.json --source ./snapshot --destination copy.db
  tablecopy --connect SANDBOX,qa,secret,token --schema --config rules.xml \\
            --source ./snapshot --destination sqlite://copy.db
")]
pub struct Cli {
    /// Connection descriptor
    #[arg(
        long,
        env = "TABLECOPY_CONNECT",
        value_name = "DESC",
        help = "Profile name or ENVIRONMENT,username,password,token (secrets are masked in logs)"
    )]
    pub connect: String,

    /// Log level
    #[arg(
        long,
        default_value = DEFAULT_LOG_LEVEL,
        value_name = "LEVEL",
        help = "Log level: error, warning, info, debug or trace"
    )]
    pub log: String,

    /// Rules document
    #[arg(long, value_name = "FILE", help = "XML rules document (default: copy every table)")]
    pub config: Option<PathBuf>,

    /// Create schema before copying data
    #[arg(long, help = "Create destination schema before copying data")]
    pub schema: bool,

    /// Suppress progress output
    #[arg(long, help = "Suppress progress messages and the final summary")]
    pub silent: bool,

    /// Trace orchestration steps
    #[arg(long, help = "Trace orchestration steps on stderr")]
    pub trace: bool,

    /// Per-call timeout
    #[arg(
        long,
        default_value_t = DEFAULT_TIMEOUT_MS,
        value_name = "MS",
        help = "Timeout in milliseconds for each call to the record service"
    )]
    pub timeout: u64,

    /// Row buffer budget
    #[arg(
        long,
        default_value_t = DEFAULT_BUFFER_MB,
        value_name = "MB",
        help = "Row buffer size in megabytes before records are flushed"
    )]
    pub buffer: u32,

    /// Snapshot root directory
    #[arg(
        long,
        env = "TABLECOPY_SOURCE",
        value_name = "DIR",
        help = "Snapshot directory serving as the record service"
    )]
    pub source: PathBuf,

    /// Destination URL
    #[arg(
        long,
        env = "TABLECOPY_DESTINATION",
        value_name = "URL",
        help = "Destination database (sqlite:// URL or .db/.sqlite path)"
    )]
    pub destination: String,

    /// Credential registry
    #[arg(
        long,
        env = "TABLECOPY_PROFILES",
        value_name = "FILE",
        help = "JSON file with named connection profiles"
    )]
    pub profiles: Option<PathBuf>,

    /// Per-table failure policy
    #[arg(
        long,
        default_value_t = TransferFailurePolicy::Abort,
        value_name = "POLICY",
        help = "What to do when a table fails to copy: abort or continue"
    )]
    pub on_transfer_error: TransferFailurePolicy,
}

impl Cli {
    /// Builds the run configuration from the flags.
    pub fn extraction_config(&self) -> ExtractionConfig {
        ExtractionConfig::new()
            .with_timeout_ms(self.timeout)
            .with_buffer_mb(self.buffer)
            .with_schema(self.schema)
            .with_silent(self.silent)
            .with_trace(self.trace)
            .with_failure_policy(self.on_transfer_error)
    }

    /// Rule source: the rules document if given, otherwise every table.
    pub fn rule_source(&self) -> RuleSource {
        self.config
            .clone()
            .map_or(RuleSource::Default, RuleSource::Document)
    }

    /// Builds the extraction request.
    pub fn request(&self) -> ExtractionRequest {
        ExtractionRequest::new(self.connect.clone()).with_rules(self.rule_source())
    }
}
