//! SQLite destination.
//!
//! # Module Structure
//! - `connection`: URL validation and pool creation
//! - `type_mapping`: Remote field types to SQLite column types
//!
//! # Storage Model
//! - One SQLite table per copied table, created with `CREATE TABLE IF NOT EXISTS`
//! - Tables not created by the schema phase are created on first write, with
//!   one TEXT column per record field
//! - Fields that appear in later batches are added with `ALTER TABLE`
//! - Field names match columns case-insensitively, as SQLite identifiers do
//! - Each batch is written in a single transaction with `INSERT OR REPLACE`,
//!   so re-running a copy into the same file refreshes rows by primary key

pub mod connection;
pub mod type_mapping;

use super::{DestinationBuilder, DestinationType};
use crate::Result;
use crate::error::CopyError;
use crate::models::{Record, TableDescription};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{debug, warn};

pub use connection::{is_in_memory, validate_sqlite_url};
pub use type_mapping::{column_definition, map_field_type, quote_identifier};

/// SQLite destination for copied tables.
pub struct SqliteDestination {
    pool: SqlitePool,
    in_memory: bool,
    /// Known column order per destination table
    columns: HashMap<String, Vec<String>>,
}

impl std::fmt::Debug for SqliteDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDestination")
            .field("in_memory", &self.in_memory)
            .field("tables", &self.columns.len())
            .finish_non_exhaustive()
    }
}

impl SqliteDestination {
    /// Opens (and creates if missing) a SQLite destination.
    ///
    /// # Errors
    /// Returns error if:
    /// - URL format is invalid
    /// - Database cannot be opened or created
    pub async fn open(url: &str) -> Result<Self> {
        let pool = connection::open_pool(url).await?;
        debug!("Opened SQLite destination (in_memory: {})", is_in_memory(url));

        Ok(Self {
            pool,
            in_memory: is_in_memory(url),
            columns: HashMap::new(),
        })
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of rows currently stored in a destination table.
    ///
    /// # Errors
    /// Returns error if the table does not exist
    pub async fn row_count(&self, table: &str) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {}",
            quote_identifier(table)
        ))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CopyError::transfer(table, format!("cannot count rows: {}", e)))
    }

    /// Column names of an existing destination table, empty if absent.
    async fn existing_columns(&self, table: &str) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CopyError::transfer(table, format!("cannot inspect table: {}", e)))
    }

    /// Makes sure every field of the batch has a column, returning the
    /// table's column order.
    async fn ensure_columns(&mut self, table: &str, records: &[Record]) -> Result<Vec<String>> {
        let mut known = match self.columns.get(table) {
            Some(columns) => columns.clone(),
            None => self.existing_columns(table).await?,
        };

        let mut missing: Vec<String> = Vec::new();
        for name in records.iter().flat_map(Record::field_names) {
            if !contains_column(&known, name) && !contains_column(&missing, name) {
                missing.push(name.clone());
            }
        }

        if known.is_empty() {
            if missing.is_empty() {
                return Ok(known);
            }
            let definitions = missing
                .iter()
                .map(|name| format!("{} TEXT", quote_identifier(name)))
                .collect::<Vec<_>>()
                .join(", ");
            self.execute(
                table,
                &format!(
                    "CREATE TABLE IF NOT EXISTS {} ({})",
                    quote_identifier(table),
                    definitions
                ),
            )
            .await?;
            debug!("Created {} from record fields ({} columns)", table, missing.len());
            known = missing;
        } else {
            for name in missing {
                self.execute(
                    table,
                    &format!(
                        "ALTER TABLE {} ADD COLUMN {} TEXT",
                        quote_identifier(table),
                        quote_identifier(&name)
                    ),
                )
                .await?;
                debug!("Added column {} to {}", name, table);
                known.push(name);
            }
        }

        self.columns.insert(table.to_string(), known.clone());
        Ok(known)
    }

    async fn execute(&self, table: &str, sql: &str) -> Result<()> {
        sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| CopyError::transfer(table, e.to_string()))
    }
}

fn contains_column(columns: &[String], name: &str) -> bool {
    columns.iter().any(|column| column.eq_ignore_ascii_case(name))
}

/// Value of the record field stored in `column`, preferring an exact match.
fn field_for_column<'r>(record: &'r Record, column: &str) -> Option<&'r Value> {
    record.get(column).or_else(|| {
        record
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    })
}

/// Binds one JSON value by kind.
fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: Option<&Value>,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        None | Some(Value::Null) => query.bind(None::<String>),
        Some(Value::Bool(b)) => query.bind(*b),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Some(Value::String(s)) => query.bind(s.clone()),
        Some(other) => query.bind(other.to_string()),
    }
}

#[async_trait]
impl DestinationBuilder for SqliteDestination {
    async fn create_schema_for_table(&mut self, table: &TableDescription) -> Result<()> {
        if table.fields.is_empty() {
            warn!(
                "{} has no described fields; its table will be created on first write",
                table.name
            );
            return Ok(());
        }

        let definitions = table
            .fields
            .iter()
            .map(column_definition)
            .collect::<Vec<_>>()
            .join(", ");
        self.execute(
            &table.name,
            &format!(
                "CREATE TABLE IF NOT EXISTS {} ({})",
                quote_identifier(&table.name),
                definitions
            ),
        )
        .await?;

        let columns = self.existing_columns(&table.name).await?;
        self.columns.insert(table.name.clone(), columns);
        Ok(())
    }

    async fn write_table(&mut self, table: &str, records: &[Record]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let columns = self.ensure_columns(table, records).await?;
        if columns.is_empty() {
            return Err(CopyError::transfer(table, "records carry no fields"));
        }

        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            quote_identifier(table),
            columns
                .iter()
                .map(|c| quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", "),
            vec!["?"; columns.len()].join(", ")
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CopyError::transfer(table, format!("cannot begin transaction: {}", e)))?;

        for record in records {
            let query = columns
                .iter()
                .fold(sqlx::query(&sql), |query, column| {
                    bind_value(query, field_for_column(record, column))
                });
            query
                .execute(&mut *tx)
                .await
                .map_err(|e| CopyError::transfer(table, format!("insert failed: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| CopyError::transfer(table, format!("commit failed: {}", e)))?;

        Ok(u64::try_from(records.len()).unwrap_or(u64::MAX))
    }

    async fn finish(&mut self) -> Result<()> {
        if !self.in_memory {
            self.pool.close().await;
        }
        Ok(())
    }

    fn destination_type(&self) -> DestinationType {
        DestinationType::SQLite
    }
}
