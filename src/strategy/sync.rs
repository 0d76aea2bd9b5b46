//! Synchronous execution strategy
//!
//! Runs batch operations sequentially on the in-memory ledger, delegating:
//! - Bulk transitions to the `bulk` coordinator
//! - Report parsing to `ReportReader` (iterator interface)
//! - Report application to `reconciliation::apply_report`
//!
//! Report rows are streamed: the report is never loaded into memory whole.

use crate::core::bulk::{self, BulkResult};
use crate::core::ledger::InMemoryLedger;
use crate::core::reconciliation::{self, ImportSummary};
use crate::io::sync_reader::ReportReader;
use crate::strategy::ExecutionStrategy;
use crate::types::{PayoutError, PayoutStatus, RequestId};
use std::path::Path;

/// Synchronous execution strategy
///
/// # Examples
///
/// ```no_run
/// use payout_engine::core::InMemoryLedger;
/// use payout_engine::strategy::{ExecutionStrategy, SyncExecutionStrategy};
/// use std::path::Path;
///
/// let mut ledger = InMemoryLedger::new();
/// let summary = SyncExecutionStrategy
///     .import_report(&mut ledger, Path::new("report.csv"))
///     .expect("Import failed");
/// println!("{} rows applied", summary.applied);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncExecutionStrategy;

impl ExecutionStrategy for SyncExecutionStrategy {
    fn bulk_transition(
        &self,
        ledger: &mut InMemoryLedger,
        ids: &[RequestId],
        target: PayoutStatus,
    ) -> Result<BulkResult, PayoutError> {
        Ok(bulk::bulk_transition(ledger, ids, target))
    }

    fn import_report(
        &self,
        ledger: &mut InMemoryLedger,
        report_path: &Path,
    ) -> Result<ImportSummary, PayoutError> {
        let reader = ReportReader::open(report_path)?;
        Ok(reconciliation::apply_report(ledger, reader))
    }
}
