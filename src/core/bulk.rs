//! Bulk operation coordinator
//!
//! Applies one target status to many requests with per-item isolation. This
//! is a best-effort batch, not a transaction: a failing id is recorded and
//! every other id is still processed. Payout records belong to independent
//! beneficiaries, so one bad record must not block the rest.
//!
//! # Guarantees
//!
//! - The state machine is called at most once per distinct id
//! - `succeeded` holds exactly the ids whose transition returned `Ok`
//!   (including idempotent no-ops), in first-occurrence input order
//! - `failed` holds every other id with its error, in input order

use super::state_machine::{self, TransitionOrigin};
use super::traits::LedgerStore;
use crate::types::{PayoutError, PayoutStatus, RequestId};
use std::collections::HashSet;

/// A single id that did not transition
#[derive(Debug, Clone, PartialEq)]
pub struct BulkFailure {
    pub id: RequestId,
    pub reason: PayoutError,
}

/// Outcome of a bulk transition
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BulkResult {
    pub succeeded: Vec<RequestId>,
    pub failed: Vec<BulkFailure>,
}

impl BulkResult {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn record(&mut self, id: RequestId, result: Result<(), PayoutError>) {
        match result {
            Ok(()) => self.succeeded.push(id),
            Err(reason) => self.failed.push(BulkFailure { id, reason }),
        }
    }

    /// Merge another result into this one
    pub fn extend(&mut self, other: BulkResult) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
    }
}

/// Distinct ids in first-occurrence order
pub fn dedup_ids(ids: &[RequestId]) -> Vec<RequestId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Transition every id to `target` on behalf of an operator
pub fn bulk_transition<L>(ledger: &mut L, ids: &[RequestId], target: PayoutStatus) -> BulkResult
where
    L: LedgerStore + ?Sized,
{
    bulk_transition_as(ledger, ids, target, TransitionOrigin::Operator)
}

/// Transition every id to `target` with an explicit origin
pub fn bulk_transition_as<L>(
    ledger: &mut L,
    ids: &[RequestId],
    target: PayoutStatus,
    origin: TransitionOrigin,
) -> BulkResult
where
    L: LedgerStore + ?Sized,
{
    let mut result = BulkResult::default();

    for id in dedup_ids(ids) {
        let outcome = state_machine::transition_as(ledger, id, target, origin).map(|_| ());
        if let Err(e) = &outcome {
            tracing::warn!(id, to = %target, error = %e, "bulk item not applied");
        }
        result.record(id, outcome);
    }

    tracing::info!(
        to = %target,
        succeeded = result.succeeded.len(),
        failed = result.failed.len(),
        "bulk transition finished"
    );

    result
}
