//! Buffered copy of one table from a session into a destination.
//!
//! Records are pulled one at a time and accumulated until their estimated
//! size reaches the budget, then flushed as one `write_table` call. The
//! remainder is flushed at end of stream.

use crate::Result;
use crate::destination::DestinationBuilder;
use crate::error::CopyError;
use crate::models::{Record, TableOutcome, TransferStatus};
use crate::monitor::ExtractionMonitor;
use crate::source::Session;
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace};

/// Runs a remote call under the per-call timeout.
///
/// # Errors
/// Returns `Timeout` naming `operation` if the call does not finish in time,
/// otherwise whatever the call returns.
pub async fn with_timeout<T, F>(operation: &str, timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| CopyError::timeout(operation, timeout))?
}

/// Copies every record of `table` into `destination`.
///
/// Progress is reported through `monitor` after each flush. Opening the
/// stream and every record pull run under `timeout`.
///
/// # Errors
/// Returns the first stream, timeout, or destination error. Batches flushed
/// before the error stay written.
pub async fn copy_table(
    session: &mut dyn Session,
    destination: &mut dyn DestinationBuilder,
    table: &str,
    budget_bytes: usize,
    timeout: Duration,
    monitor: &dyn ExtractionMonitor,
) -> Result<TableOutcome> {
    monitor.report_message(&format!("Copying {}", table));

    let mut stream = with_timeout(
        &format!("open records of {}", table),
        timeout,
        session.records(table),
    )
    .await?;

    let mut batch: Vec<Record> = Vec::new();
    let mut batch_bytes = 0usize;
    let mut rows = 0u64;
    let mut batches = 0u64;

    loop {
        let next = tokio::time::timeout(timeout, stream.next())
            .await
            .map_err(|_| CopyError::timeout(format!("read records of {}", table), timeout))?;

        let Some(record) = next else {
            break;
        };
        let record = record?;

        batch_bytes = batch_bytes.saturating_add(record.estimated_size());
        batch.push(record);

        if batch_bytes >= budget_bytes {
            rows = rows.saturating_add(flush(destination, table, &mut batch, batch_bytes).await?);
            batches = batches.saturating_add(1);
            batch_bytes = 0;
            monitor.report_message(&format!("{}: {} rows copied", table, rows));
        }
    }

    if !batch.is_empty() {
        rows = rows.saturating_add(flush(destination, table, &mut batch, batch_bytes).await?);
        batches = batches.saturating_add(1);
        monitor.report_message(&format!("{}: {} rows copied", table, rows));
    }

    monitor.report_message(&format!("Copied {} ({} rows)", table, rows));
    debug!("{}: {} rows in {} batches", table, rows, batches);

    Ok(TableOutcome {
        table: table.to_string(),
        rows,
        batches,
        status: TransferStatus::Copied,
    })
}

async fn flush(
    destination: &mut dyn DestinationBuilder,
    table: &str,
    batch: &mut Vec<Record>,
    batch_bytes: usize,
) -> Result<u64> {
    trace!("Flushing {} records ({} bytes) of {}", batch.len(), batch_bytes, table);
    let written = destination.write_table(table, batch).await?;
    batch.clear();
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::DestinationType;
    use crate::models::TableDescription;
    use crate::monitor::SilentMonitor;
    use crate::source::RecordStream;
    use async_trait::async_trait;

    struct FixedSession {
        records: Vec<Record>,
        stall: bool,
    }

    #[async_trait]
    impl Session for FixedSession {
        async fn list_tables(&mut self) -> Result<Vec<String>> {
            Ok(vec!["Account".to_string()])
        }

        async fn describe_table(&mut self, table: &str) -> Result<TableDescription> {
            Ok(TableDescription::new(table))
        }

        async fn records(&mut self, _table: &str) -> Result<RecordStream> {
            if self.stall {
                return Ok(futures::stream::pending().boxed());
            }
            Ok(futures::stream::iter(self.records.clone().into_iter().map(Ok)).boxed())
        }
    }

    #[derive(Default)]
    struct BatchRecorder {
        batches: Vec<Vec<Record>>,
    }

    #[async_trait]
    impl DestinationBuilder for BatchRecorder {
        async fn create_schema_for_table(&mut self, _table: &TableDescription) -> Result<()> {
            Ok(())
        }

        async fn write_table(&mut self, _table: &str, records: &[Record]) -> Result<u64> {
            self.batches.push(records.to_vec());
            Ok(records.len() as u64)
        }

        fn destination_type(&self) -> DestinationType {
            DestinationType::SQLite
        }
    }

    fn records(count: usize) -> Vec<Record> {
        (0..count)
            .map(|i| Record::new().with("Id", format!("{:03}", i)))
            .collect()
    }

    #[tokio::test]
    async fn test_copy_table_flushes_at_budget() {
        // Each record is 2 + 3 = 5 bytes.
        let mut session = FixedSession {
            records: records(7),
            stall: false,
        };
        let mut destination = BatchRecorder::default();

        let outcome = copy_table(
            &mut session,
            &mut destination,
            "Account",
            10,
            Duration::from_secs(5),
            &SilentMonitor,
        )
        .await
        .unwrap();

        let sizes: Vec<usize> = destination.batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 2, 1]);
        assert_eq!(outcome.rows, 7);
        assert_eq!(outcome.batches, 4);
        assert!(outcome.is_copied());
    }

    #[tokio::test]
    async fn test_copy_table_empty_table_writes_nothing() {
        let mut session = FixedSession {
            records: Vec::new(),
            stall: false,
        };
        let mut destination = BatchRecorder::default();

        let outcome = copy_table(
            &mut session,
            &mut destination,
            "Account",
            10,
            Duration::from_secs(5),
            &SilentMonitor,
        )
        .await
        .unwrap();

        assert!(destination.batches.is_empty());
        assert_eq!(outcome.rows, 0);
        assert_eq!(outcome.batches, 0);
    }

    #[tokio::test]
    async fn test_copy_table_oversized_record_flushed_alone() {
        let mut session = FixedSession {
            records: records(3),
            stall: false,
        };
        let mut destination = BatchRecorder::default();

        copy_table(
            &mut session,
            &mut destination,
            "Account",
            1,
            Duration::from_secs(5),
            &SilentMonitor,
        )
        .await
        .unwrap();

        assert!(destination.batches.iter().all(|b| b.len() == 1));
        assert_eq!(destination.batches.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_table_pull_timeout() {
        let mut session = FixedSession {
            records: Vec::new(),
            stall: true,
        };
        let mut destination = BatchRecorder::default();

        let error = copy_table(
            &mut session,
            &mut destination,
            "Account",
            10,
            Duration::from_millis(50),
            &SilentMonitor,
        )
        .await
        .unwrap_err();

        assert!(matches!(error, CopyError::Timeout { timeout_ms: 50, .. }));
        assert!(error.to_string().contains("Account"));
    }
}
