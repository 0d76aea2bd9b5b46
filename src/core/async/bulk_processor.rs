//! Concurrent bulk processing with beneficiary-based partitioning
//!
//! This module provides the `BulkProcessor` struct, which applies bulk
//! transitions and completion-report rows across tokio tasks, one task per
//! beneficiary.
//!
//! # Design
//!
//! Ids (or report rows) are partitioned by the beneficiary that owns them.
//! Partitions run concurrently; inside a partition items run sequentially in
//! input order. Results are reassembled in input order, so callers see the
//! same `BulkResult` / `ImportSummary` the sequential coordinator would
//! produce.
//!
//! # Architecture
//!
//! ```text
//! BulkProcessor
//!     └── Arc<SharedLedger>  (DashMap-backed, per-record locking)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use super::SharedLedger;
use crate::core::bulk::{dedup_ids, BulkResult};
use crate::core::reconciliation::{ImportSummary, ReportRow};
use crate::core::state_machine::TransitionOrigin;
use crate::types::{BeneficiaryId, PayoutError, PayoutStatus, RequestId};

/// Partition key: owning beneficiary, `None` for orphaned or unknown ids
type PartitionKey = Option<BeneficiaryId>;

/// Bulk processor with beneficiary-based partitioning
#[derive(Debug, Clone)]
pub struct BulkProcessor {
    /// Thread-safe ledger shared by every task
    ledger: Arc<SharedLedger>,
}

impl BulkProcessor {
    pub fn new(ledger: Arc<SharedLedger>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Arc<SharedLedger> {
        &self.ledger
    }

    fn partition_key(&self, id: RequestId) -> PartitionKey {
        self.ledger.beneficiary_of(id).flatten()
    }

    /// Partition ids by owning beneficiary
    ///
    /// # Guarantees
    ///
    /// - Each id appears in exactly one partition
    /// - Ids within a partition keep their input order
    pub fn partition_by_beneficiary(
        &self,
        ids: &[RequestId],
    ) -> HashMap<PartitionKey, Vec<RequestId>> {
        let mut partitions: HashMap<PartitionKey, Vec<RequestId>> = HashMap::new();
        for &id in ids {
            partitions.entry(self.partition_key(id)).or_default().push(id);
        }
        partitions
    }

    /// Transition one partition's ids sequentially
    pub fn process_partition(
        &self,
        ids: &[RequestId],
        target: PayoutStatus,
        origin: TransitionOrigin,
    ) -> Vec<(RequestId, Result<(), PayoutError>)> {
        ids.iter()
            .map(|&id| {
                let result = self.ledger.transition(id, target, origin).map(|_| ());
                (id, result)
            })
            .collect()
    }

    /// Transition every id concurrently, one task per beneficiary
    ///
    /// Duplicate ids are processed once. Must be called from within a tokio
    /// runtime.
    pub async fn process_bulk(
        &self,
        ids: &[RequestId],
        target: PayoutStatus,
        origin: TransitionOrigin,
    ) -> BulkResult {
        let ids = dedup_ids(ids);
        let partitions = self.partition_by_beneficiary(&ids);

        let mut tasks = Vec::with_capacity(partitions.len());
        for (_beneficiary, members) in partitions {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_partition(&members, target, origin)
            }));
        }

        let mut outcomes: HashMap<RequestId, Result<(), PayoutError>> = HashMap::new();
        for task in tasks {
            match task.await {
                Ok(results) => outcomes.extend(results),
                Err(e) => tracing::error!(error = %e, "bulk partition task panicked"),
            }
        }

        let mut result = BulkResult::default();
        for id in ids {
            let outcome = outcomes.remove(&id).unwrap_or_else(|| {
                Err(PayoutError::IoError {
                    message: format!("worker task for payout request {id} did not complete"),
                })
            });
            if let Err(e) = &outcome {
                tracing::warn!(id, to = %target, error = %e, "bulk item not applied");
            }
            result.record(id, outcome);
        }

        tracing::info!(
            to = %target,
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            "concurrent bulk transition finished"
        );

        result
    }

    /// Apply a batch of report rows concurrently, one task per beneficiary
    ///
    /// Warnings keep report order. Rows for the same request always share a
    /// partition, so they apply in report order.
    pub async fn process_report_batch(
        &self,
        rows: Vec<Result<ReportRow, PayoutError>>,
    ) -> ImportSummary {
        let mut slots: Vec<Option<Result<(), PayoutError>>> = vec![None; rows.len()];
        let mut partitions: HashMap<PartitionKey, Vec<(usize, ReportRow)>> = HashMap::new();

        for (index, row) in rows.into_iter().enumerate() {
            match row {
                Ok(row) => partitions
                    .entry(self.partition_key(row.request_id))
                    .or_default()
                    .push((index, row)),
                Err(e) => slots[index] = Some(Err(e)),
            }
        }

        let mut tasks = Vec::with_capacity(partitions.len());
        for (_beneficiary, members) in partitions {
            let ledger = Arc::clone(&self.ledger);
            tasks.push(tokio::spawn(async move {
                members
                    .into_iter()
                    .map(|(index, row)| (index, apply_shared_row(&ledger, &row)))
                    .collect::<Vec<_>>()
            }));
        }

        for task in tasks {
            match task.await {
                Ok(results) => {
                    for (index, result) in results {
                        slots[index] = Some(result);
                    }
                }
                Err(e) => tracing::error!(error = %e, "report partition task panicked"),
            }
        }

        let mut summary = ImportSummary::default();
        for slot in slots {
            match slot.unwrap_or_else(|| {
                Err(PayoutError::IoError {
                    message: "report worker task did not complete".to_string(),
                })
            }) {
                Ok(()) => summary.applied += 1,
                Err(e) => {
                    tracing::warn!(error = %e, "report row not applied");
                    summary.warnings.push(e);
                }
            }
        }

        summary
    }
}

/// Apply one report row against the shared ledger
fn apply_shared_row(ledger: &SharedLedger, row: &ReportRow) -> Result<(), PayoutError> {
    ledger
        .transition(
            row.request_id,
            row.outcome.target_status(),
            TransitionOrigin::Reconciliation,
        )
        .map(|_| ())
        .map_err(|e| match e {
            PayoutError::NotFound { .. } => {
                PayoutError::import_row_mismatch(row.line, &row.request_id.to_string())
            }
            other => other,
        })
}
