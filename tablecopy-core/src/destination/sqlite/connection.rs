//! SQLite destination connection handling.
//!
//! # Connection Modes
//! - File-based: `sqlite:///path/to/copy.db` or `sqlite://./relative.db`
//! - Plain path: `/path/to/copy.db`, `copy.sqlite`, `copy.sqlite3`
//! - In-memory: `sqlite::memory:` or `:memory:`
//!
//! Database files are created when missing.

use crate::Result;
use crate::error::CopyError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Time allowed to acquire the destination connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Validates SQLite destination URL format.
///
/// # Errors
/// Returns error if the URL is neither a sqlite URL, a database file path,
/// nor `:memory:`
pub fn validate_sqlite_url(url: &str) -> Result<()> {
    if url == ":memory:" {
        return Ok(());
    }

    if url.ends_with(".db") || url.ends_with(".sqlite") || url.ends_with(".sqlite3") {
        return Ok(());
    }

    if url.starts_with("sqlite:") {
        if url.contains(":memory:") || url.contains("mode=memory") {
            return Ok(());
        }

        if let Ok(parsed) = Url::parse(url) {
            if parsed.scheme() != "sqlite" {
                return Err(CopyError::configuration(
                    "Destination must use sqlite:// scheme",
                ));
            }
            return Ok(());
        }

        if url.starts_with("sqlite://") {
            return Ok(());
        }
    }

    Err(CopyError::configuration(
        "Invalid SQLite destination: expected sqlite:// URL, file path, or :memory:",
    ))
}

/// Whether the URL names an in-memory database.
pub fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Normalizes a destination to SQLite URL format.
pub(crate) fn normalize_url(url: &str) -> String {
    if url == ":memory:" {
        return "sqlite::memory:".to_string();
    }

    if url.starts_with("sqlite:") {
        return url.to_string();
    }

    format!("sqlite://{}", url)
}

/// Opens a single-connection pool, creating the database file if needed.
///
/// # Errors
/// Returns `DestinationUnavailable` if the database cannot be opened
pub(crate) async fn open_pool(url: &str) -> Result<SqlitePool> {
    validate_sqlite_url(url)?;

    let options = SqliteConnectOptions::from_str(&normalize_url(url))
        .map_err(|e| CopyError::destination_unavailable("Invalid SQLite destination", e))?
        .create_if_missing(true);

    // One connection keeps an in-memory database alive for the whole run.
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| CopyError::destination_unavailable("Failed to open SQLite database", e))
}
