//! Execution strategy module for batch payout operations
//!
//! This module defines the Strategy pattern for the two batch operations that
//! touch many ledger records at once: bulk transitions and completion-report
//! imports. Different implementations (sequential, concurrent) can be
//! selected at runtime and must produce identical results.

use crate::cli::StrategyType;
use crate::core::bulk::BulkResult;
use crate::core::ledger::InMemoryLedger;
use crate::core::reconciliation::ImportSummary;
use crate::types::{PayoutError, PayoutStatus, RequestId};
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncExecutionStrategy, BatchConfig};
pub use sync::SyncExecutionStrategy;

/// Execution strategy trait for batch payout operations
///
/// Both operations mutate the ledger in place and never abort on a per-item
/// error: failures are collected into the returned result.
pub trait ExecutionStrategy: Send + Sync {
    /// Transition every id to `target` on behalf of an operator
    ///
    /// # Arguments
    ///
    /// * `ledger` - Ledger to update in place
    /// * `ids` - Request ids, duplicates processed once
    /// * `target` - Target status
    ///
    /// # Returns
    ///
    /// * `Ok(BulkResult)` with succeeded and failed ids in input order
    /// * `Err(PayoutError)` only if the strategy itself could not run
    fn bulk_transition(
        &self,
        ledger: &mut InMemoryLedger,
        ids: &[RequestId],
        target: PayoutStatus,
    ) -> Result<BulkResult, PayoutError>;

    /// Apply a completion report file to the ledger
    ///
    /// # Arguments
    ///
    /// * `ledger` - Ledger to update in place
    /// * `report_path` - Path to the completion report CSV
    ///
    /// # Returns
    ///
    /// * `Ok(ImportSummary)` with the applied count and every row warning
    /// * `Err(PayoutError)` if the report cannot be opened or is malformed
    fn import_report(
        &self,
        ledger: &mut InMemoryLedger,
        report_path: &Path,
    ) -> Result<ImportSummary, PayoutError>;
}

/// Create an execution strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of execution strategy to create (Sync or Async)
/// * `config` - Optional configuration for async batch processing (ignored for sync)
///
/// # Returns
///
/// A boxed trait object implementing the ExecutionStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ExecutionStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncExecutionStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncExecutionStrategy::new(config))
        }
    }
}
