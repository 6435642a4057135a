//! Core extraction engine for tablecopy.
//!
//! This crate decides which tables of a remote record service take part in a
//! copy and sequences the copy into a destination database. The `tablecopy`
//! binary is a thin CLI over [`ExtractionOrchestrator`].
//!
//! # Security Guarantees
//! - Passwords and security tokens are zeroized on drop
//! - Credentials never appear in error messages, logs, or trace narration
//!
//! # Architecture
//! - Rule evaluation is a pure function over the whole [`RuleSet`]
//! - The remote service and the destination sit behind async traits
//! - Progress goes through a one-method [`ExtractionMonitor`]

pub mod config;
pub mod destination;
pub mod error;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod orchestrator;
pub mod rules;
pub mod security;
pub mod source;
pub mod transfer;

// Re-export commonly used types
pub use config::{
    ConfigDocumentInterpreter, DeclarationEvent, ExtractionConfig, TransferFailurePolicy,
    read_rules_document,
};
pub use destination::{
    DestinationBuilder, DestinationFactory, DestinationType, DestinationUrl, create_destination,
};
pub use error::{CopyError, Result};
pub use models::{
    ExtractionSummary, FieldDescription, FieldType, Record, TableDescription, TableOutcome,
    TransferStatus,
};
pub use monitor::{ExtractionMonitor, SilentMonitor, VerboseMonitor, monitor_for};
pub use orchestrator::{ExtractionOrchestrator, ExtractionRequest, RuleSource};
pub use rules::{RuleKind, RuleSet, TableRule};
pub use security::{
    ConnectionDescriptor, ConnectionResolver, CredentialRegistry, Credentials, Environment,
    ProfileRegistry,
};
pub use source::{RecordStream, RemoteService, Session, SnapshotService};
