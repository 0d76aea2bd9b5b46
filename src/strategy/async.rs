//! Asynchronous batch execution strategy
//!
//! This module provides a multi-threaded implementation of the
//! ExecutionStrategy trait. Work is partitioned by beneficiary and spread over
//! tokio worker threads.
//!
//! # Architecture
//!
//! ```text
//! AsyncExecutionStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReportReader (batch CSV reading)
//!     ├── BulkProcessor (beneficiary partitioning + tokio tasks)
//!     └── SharedLedger (DashMap-backed, per-record locking)
//! ```
//!
//! # Ordering
//!
//! - Report batches are processed one after another, so rows for the same
//!   request apply in report order across the whole file
//! - Within a batch, different beneficiaries are processed in parallel
//! - Results are reassembled in input order, identical to the sync strategy
//!
//! The shared ledger is copied back into the caller's in-memory ledger when
//! the run finishes, keeping the original record order.

use crate::core::bulk::BulkResult;
use crate::core::ledger::InMemoryLedger;
use crate::core::r#async::{BulkProcessor, SharedLedger};
use crate::core::reconciliation::ImportSummary;
use crate::core::state_machine::TransitionOrigin;
use crate::core::traits::LedgerStore;
use crate::io::async_reader::AsyncReportReader;
use crate::io::snapshot::open_file;
use crate::strategy::ExecutionStrategy;
use crate::types::{PayoutError, PayoutStatus, RequestId};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Configuration for batch processing
///
/// Controls how report rows are batched and the number of worker threads
/// for parallel processing within each batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of report rows per batch
    pub batch_size: usize,
    /// Number of tokio worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// A zero value falls back to its default with a warning.
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            tracing::warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "invalid max_concurrent_batches, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch execution strategy
///
/// # Configuration
///
/// The strategy accepts a BatchConfig with:
/// - `batch_size`: Number of report rows per batch (default: 1000)
/// - `max_concurrent_batches`: Number of worker threads (default: CPU cores)
#[derive(Debug, Clone)]
pub struct AsyncExecutionStrategy {
    /// Batch processing configuration
    config: BatchConfig,
}

impl AsyncExecutionStrategy {
    /// Create a new AsyncExecutionStrategy with the specified configuration
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Run `job` against a shared copy of the ledger, then copy it back
    fn run_shared<T, F, Fut>(&self, ledger: &mut InMemoryLedger, job: F) -> Result<T, PayoutError>
    where
        F: FnOnce(BulkProcessor) -> Fut,
        Fut: Future<Output = Result<T, PayoutError>>,
    {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| PayoutError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        let shared = Arc::new(SharedLedger::from_requests(ledger.all()));
        let processor = BulkProcessor::new(Arc::clone(&shared));

        let output = runtime.block_on(job(processor))?;

        *ledger = InMemoryLedger::from_requests(shared.all());
        Ok(output)
    }
}

impl ExecutionStrategy for AsyncExecutionStrategy {
    fn bulk_transition(
        &self,
        ledger: &mut InMemoryLedger,
        ids: &[RequestId],
        target: PayoutStatus,
    ) -> Result<BulkResult, PayoutError> {
        self.run_shared(ledger, |processor| async move {
            Ok(processor
                .process_bulk(ids, target, TransitionOrigin::Operator)
                .await)
        })
    }

    /// Apply a completion report batch by batch
    ///
    /// Each batch is fully applied before the next one is read.
    fn import_report(
        &self,
        ledger: &mut InMemoryLedger,
        report_path: &Path,
    ) -> Result<ImportSummary, PayoutError> {
        let batch_size = self.config.batch_size;

        self.run_shared(ledger, |processor| async move {
            let file = tokio::fs::File::from_std(open_file(report_path)?);

            // Wrap tokio file in a compatibility layer for csv-async
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReportReader::new(compat_file).await?;

            let mut summary = ImportSummary::default();
            loop {
                let batch = reader.read_batch(batch_size).await;
                if batch.is_empty() {
                    break;
                }
                summary.extend(processor.process_report_batch(batch).await);
            }

            tracing::info!(
                applied = summary.applied,
                warnings = summary.warnings.len(),
                "completion report imported"
            );

            Ok(summary)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PayoutRequest, Period};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn ledger(count: u64, status: PayoutStatus) -> InMemoryLedger {
        InMemoryLedger::from_requests((1..=count).map(|id| {
            PayoutRequest::new(
                id,
                Some(id % 4),
                Decimal::ONE,
                Decimal::ZERO,
                Period::new(1, 2024),
                Utc::now(),
            )
            .with_status(status)
        }))
    }

    #[test]
    fn test_batch_config_zero_values_fall_back() {
        let config = BatchConfig::new(0, 0);
        assert_eq!(config, BatchConfig::default());

        let config = BatchConfig::new(5, 2);
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.max_concurrent_batches, 2);
    }

    #[test]
    fn test_async_strategy_bulk_transition_keeps_order() {
        let mut ledger = ledger(20, PayoutStatus::Pending);
        let ids: Vec<RequestId> = (1..=20).rev().chain([99]).collect();
        let strategy = AsyncExecutionStrategy::new(BatchConfig::new(5, 4));

        let result = strategy
            .bulk_transition(&mut ledger, &ids, PayoutStatus::Approved)
            .unwrap();

        assert_eq!(result.succeeded, (1..=20).rev().collect::<Vec<_>>());
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].id, 99);

        let order: Vec<RequestId> = ledger.all().iter().map(|r| r.id).collect();
        assert_eq!(order, (1..=20).collect::<Vec<_>>());
        assert!(ledger
            .all()
            .iter()
            .all(|r| r.status == PayoutStatus::Approved));
    }

    #[test]
    fn test_async_strategy_import_across_batches() {
        let mut ledger = ledger(4, PayoutStatus::Processing);
        let file = create_temp_csv(
            "request_id,status\n1,paid\n2,failed\n77,paid\n3,payment_method_not_found\n4,bogus\n",
        );
        let strategy = AsyncExecutionStrategy::new(BatchConfig::new(2, 2));

        let summary = strategy.import_report(&mut ledger, file.path()).unwrap();

        assert_eq!(summary.applied, 3);
        assert_eq!(summary.warnings.len(), 2);
        assert_eq!(
            summary.warnings[0],
            PayoutError::import_row_mismatch(4, "77")
        );
        assert_eq!(ledger.get(1).unwrap().status, PayoutStatus::Paid);
        assert_eq!(ledger.get(2).unwrap().status, PayoutStatus::Failed);
        assert_eq!(
            ledger.get(3).unwrap().status,
            PayoutStatus::PaymentMethodNotFound
        );
        assert_eq!(ledger.get(4).unwrap().status, PayoutStatus::Processing);
    }

    #[test]
    fn test_async_strategy_handles_missing_file() {
        let mut ledger = ledger(1, PayoutStatus::Processing);
        let strategy = AsyncExecutionStrategy::new(BatchConfig::default());

        let result = strategy.import_report(&mut ledger, Path::new("nonexistent.csv"));

        assert!(matches!(result, Err(PayoutError::FileNotFound { .. })));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_async_strategy_rejects_malformed_report() {
        let mut ledger = ledger(1, PayoutStatus::Processing);
        let file = create_temp_csv("id,outcome\n1,paid\n");
        let strategy = AsyncExecutionStrategy::new(BatchConfig::default());

        let result = strategy.import_report(&mut ledger, file.path());

        assert!(matches!(
            result,
            Err(PayoutError::MalformedImportFile { .. })
        ));
    }
}
