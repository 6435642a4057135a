//! Snapshot service: a local directory standing in for the remote service.
//!
//! Layout:
//!
//! ```text
//! <root>/
//!   production/
//!     manifest.json      {"tables": [{"name": "Account", "fields": [...]}], "users": [...]}
//!     Account.jsonl      one JSON object per line
//!   sandbox/
//!     ...
//! ```
//!
//! The login environment selects the subdirectory. A table listed in the
//! manifest without a `.jsonl` file is an empty table.

use super::{RecordStream, RemoteService, Session};
use crate::Result;
use crate::error::CopyError;
use crate::models::{Record, TableDescription};
use crate::security::Credentials;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

/// Manifest file name inside each environment directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Contents of `manifest.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotManifest {
    /// Tables in service order
    #[serde(default)]
    pub tables: Vec<TableDescription>,
    /// Usernames allowed to log in; empty allows any non-blank username
    #[serde(default)]
    pub users: Vec<String>,
}

/// Remote service backed by a snapshot directory.
#[derive(Debug, Clone)]
pub struct SnapshotService {
    root: PathBuf,
}

impl SnapshotService {
    /// Creates a service rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Snapshot root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl RemoteService for SnapshotService {
    async fn login(&self, credentials: &Credentials) -> Result<Box<dyn Session>> {
        let username = credentials.username();
        if username.trim().is_empty() {
            return Err(CopyError::authentication(username, "username is blank"));
        }

        let dir = self.root.join(credentials.environment().as_str());
        let manifest_path = dir.join(MANIFEST_FILE);
        let json = tokio::fs::read_to_string(&manifest_path)
            .await
            .map_err(|_| {
                CopyError::authentication(
                    username,
                    format!(
                        "no {} environment available at {}",
                        credentials.environment(),
                        dir.display()
                    ),
                )
            })?;

        let manifest: SnapshotManifest = serde_json::from_str(&json).map_err(|e| {
            CopyError::serialization(format!("Invalid manifest {}", manifest_path.display()), e)
        })?;

        if !manifest.users.is_empty() && !manifest.users.iter().any(|u| u == username) {
            return Err(CopyError::authentication(
                username,
                "user is not authorized for this environment",
            ));
        }

        info!(
            "Logged in to {} snapshot as '{}' ({} tables)",
            credentials.environment(),
            username,
            manifest.tables.len()
        );

        Ok(Box::new(SnapshotSession { dir, manifest }))
    }
}

/// Session over one environment directory of a snapshot.
#[derive(Debug)]
pub struct SnapshotSession {
    dir: PathBuf,
    manifest: SnapshotManifest,
}

#[async_trait]
impl Session for SnapshotSession {
    async fn list_tables(&mut self) -> Result<Vec<String>> {
        Ok(self.manifest.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn describe_table(&mut self, table: &str) -> Result<TableDescription> {
        self.manifest
            .tables
            .iter()
            .find(|t| t.name == table)
            .cloned()
            .ok_or_else(|| CopyError::transfer(table, "table is not part of the snapshot"))
    }

    async fn records(&mut self, table: &str) -> Result<RecordStream> {
        if !self.manifest.tables.iter().any(|t| t.name == table) {
            return Err(CopyError::transfer(table, "table is not part of the snapshot"));
        }

        let path = self.dir.join(format!("{}.jsonl", table));
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No data file for {}, treating as empty", table);
                return Ok(futures::stream::empty().boxed());
            }
            Err(e) => {
                return Err(CopyError::transfer(
                    table,
                    format!("cannot open {}: {}", path.display(), e),
                ));
            }
        };

        let lines = BufReader::new(file).lines();
        let table = table.to_string();

        let stream = futures::stream::unfold(
            (lines, 0usize, table),
            |(mut lines, mut line_no, table)| async move {
                loop {
                    line_no = line_no.saturating_add(1);
                    let item = match lines.next_line().await {
                        Ok(Some(line)) if line.trim().is_empty() => continue,
                        Ok(Some(line)) => serde_json::from_str::<Record>(&line).map_err(|e| {
                            CopyError::transfer(
                                table.as_str(),
                                format!("line {}: invalid record: {}", line_no, e),
                            )
                        }),
                        Ok(None) => return None,
                        Err(e) => Err(CopyError::transfer(
                            table.as_str(),
                            format!("line {}: read failed: {}", line_no, e),
                        )),
                    };
                    return Some((item, (lines, line_no, table)));
                }
            },
        );

        Ok(stream.boxed())
    }
}
