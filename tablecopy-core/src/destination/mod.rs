//! Destination builder traits and factory.
//!
//! A destination receives schema creation requests and batches of records.
//! The orchestrator only sees [`DestinationBuilder`]; the storage model is up
//! to the implementation.
//!
//! # Module Structure
//! - `sqlite`: SQLite destination (feature `sqlite`)

use crate::Result;
use crate::models::{Record, TableDescription};
use async_trait::async_trait;
use std::fmt;

#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Destination database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationType {
    /// SQLite file or in-memory database
    SQLite,
}

impl fmt::Display for DestinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SQLite => write!(f, "SQLite"),
        }
    }
}

/// Writes copied tables into a destination database.
///
/// # Object Safety
/// This trait is object-safe, allowing `Box<dyn DestinationBuilder>`.
#[async_trait]
pub trait DestinationBuilder: Send {
    /// Creates destination structures for one table.
    async fn create_schema_for_table(&mut self, table: &TableDescription) -> Result<()>;

    /// Writes one flushed batch of records, returning the number of rows
    /// written.
    async fn write_table(&mut self, table: &str, records: &[Record]) -> Result<u64>;

    /// Flushes and releases the destination at the end of a run.
    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    /// Engine behind this destination.
    fn destination_type(&self) -> DestinationType;
}

/// Opens destinations. Called once per extraction run.
#[async_trait]
pub trait DestinationFactory: Send + Sync {
    /// Opens the destination.
    ///
    /// # Errors
    /// Returns error if the destination cannot be reached or created.
    async fn open(&self) -> Result<Box<dyn DestinationBuilder>>;
}

/// Factory that opens a destination from a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationUrl(String);

impl DestinationUrl {
    /// Wraps a destination URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl DestinationFactory for DestinationUrl {
    async fn open(&self) -> Result<Box<dyn DestinationBuilder>> {
        create_destination(&self.0).await
    }
}

/// Creates a destination based on the URL.
///
/// # Errors
/// Returns error if:
/// - URL format is unrecognized
/// - The engine is not compiled in
/// - The database cannot be opened
pub async fn create_destination(url: &str) -> Result<Box<dyn DestinationBuilder>> {
    match detect_destination_type(url)? {
        #[cfg(feature = "sqlite")]
        DestinationType::SQLite => {
            let destination = sqlite::SqliteDestination::open(url).await?;
            Ok(Box::new(destination))
        }
        #[cfg(not(feature = "sqlite"))]
        DestinationType::SQLite => Err(crate::error::CopyError::configuration(
            "SQLite destination not compiled in. Use --features sqlite",
        )),
    }
}

/// Detects the destination engine from a URL.
///
/// # Errors
/// Returns error if the URL format is unrecognized
pub fn detect_destination_type(url: &str) -> Result<DestinationType> {
    if url.starts_with("sqlite:")
        || url == ":memory:"
        || url.ends_with(".db")
        || url.ends_with(".sqlite")
        || url.ends_with(".sqlite3")
    {
        Ok(DestinationType::SQLite)
    } else {
        Err(crate::error::CopyError::configuration(format!(
            "Unrecognized destination '{}': expected sqlite:// URL or .db/.sqlite path",
            url
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_destination_type() {
        for url in [
            "sqlite://copy.db",
            "sqlite::memory:",
            ":memory:",
            "/tmp/out.db",
            "out.sqlite3",
        ] {
            assert_eq!(
                detect_destination_type(url).unwrap(),
                DestinationType::SQLite,
                "url {}",
                url
            );
        }
    }

    #[test]
    fn test_detect_destination_type_unknown() {
        let error = detect_destination_type("postgres://localhost/db").unwrap_err();
        assert!(error.to_string().contains("postgres://localhost/db"));
    }

    #[test]
    fn test_destination_url() {
        let url = DestinationUrl::new("sqlite::memory:");
        assert_eq!(url.as_str(), "sqlite::memory:");
        assert_eq!(DestinationType::SQLite.to_string(), "SQLite");
    }
}
