//! Remote service collaborator traits.
//!
//! The orchestrator talks to the remote record service only through these
//! traits. Wire protocol and session lifecycle belong to the implementation.
//!
//! # Module Structure
//! - `snapshot`: local directory standing in for the remote service

use crate::Result;
use crate::models::{Record, TableDescription};
use crate::security::Credentials;
use async_trait::async_trait;
use futures::stream::BoxStream;

pub mod snapshot;

pub use snapshot::{SnapshotManifest, SnapshotService};

/// Records of one table, in service order.
pub type RecordStream = BoxStream<'static, Result<Record>>;

/// Entry point of the remote record service.
///
/// # Object Safety
/// This trait is object-safe, allowing `Arc<dyn RemoteService>`.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Authenticates and opens a session.
    ///
    /// # Errors
    /// Returns `Authentication` if the credentials are rejected.
    async fn login(&self, credentials: &Credentials) -> Result<Box<dyn Session>>;
}

/// Authenticated handle to the remote service.
///
/// A session belongs to a single extraction run and is dropped at its end.
#[async_trait]
pub trait Session: Send {
    /// Names of all tables visible to this session, in service order.
    async fn list_tables(&mut self) -> Result<Vec<String>>;

    /// Structure of one table.
    async fn describe_table(&mut self, table: &str) -> Result<TableDescription>;

    /// Opens the record stream of one table.
    async fn records(&mut self, table: &str) -> Result<RecordStream>;
}
