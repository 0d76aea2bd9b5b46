//! Thread-safe payout ledger for concurrent operators
//!
//! This module provides the `SharedLedger` struct, which stores payout
//! requests in a `DashMap` so that many tasks can transition different
//! requests at once.
//!
//! # Design
//!
//! Each transition runs while holding the request's map entry, so the status
//! check and the write happen together for that one record. Requests remember
//! the order they were first inserted in, and `find` returns that order, which
//! keeps listings and aggregation identical to the in-memory ledger.
//!
//! # Thread Safety
//!
//! - Concurrent transitions of different requests don't block each other
//! - Transitions of the same request are serialized by the entry lock
//! - Two operators racing to the same target both succeed (idempotent)

use crate::core::stage::StageFilter;
use crate::core::state_machine::{apply_transition, TransitionOrigin, TransitionOutcome};
use crate::core::traits::LedgerStore;
use crate::types::{BeneficiaryId, PayoutError, PayoutRequest, PayoutStatus, RequestId};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct Slot {
    /// Insertion sequence number, fixed on first insert
    seq: u64,
    request: PayoutRequest,
}

/// Thread-safe payout ledger
#[derive(Debug, Default)]
pub struct SharedLedger {
    /// Concurrent map of request id to stored record
    records: DashMap<RequestId, Slot>,

    next_seq: AtomicU64,
}

impl SharedLedger {
    /// Create a new empty SharedLedger
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Build a ledger from records in order
    pub fn from_requests<I>(requests: I) -> Self
    where
        I: IntoIterator<Item = PayoutRequest>,
    {
        let ledger = SharedLedger::new();
        for request in requests {
            ledger.insert(request);
        }
        ledger
    }

    /// Insert or replace a record (thread-safe)
    ///
    /// A replaced record keeps its original ledger position.
    pub fn insert(&self, request: PayoutRequest) -> PayoutRequest {
        let stored = request.clone();
        self.records
            .entry(request.id)
            .and_modify(|slot| slot.request = request.clone())
            .or_insert_with(|| Slot {
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                request,
            });
        stored
    }

    /// Get a record by id (cloned to avoid holding the entry lock)
    pub fn get(&self, id: RequestId) -> Option<PayoutRequest> {
        self.records.get(&id).map(|slot| slot.request.clone())
    }

    /// Beneficiary of a known record
    ///
    /// `None` if the id is unknown, `Some(None)` for an orphaned record.
    pub fn beneficiary_of(&self, id: RequestId) -> Option<Option<BeneficiaryId>> {
        self.records.get(&id).map(|slot| slot.request.beneficiary_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Update a record with a closure while holding its entry
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is unknown, or whatever the closure returns.
    pub fn update<T, F>(&self, id: RequestId, f: F) -> Result<T, PayoutError>
    where
        F: FnOnce(&mut PayoutRequest) -> Result<T, PayoutError>,
    {
        match self.records.get_mut(&id) {
            Some(mut slot) => f(&mut slot.request),
            None => Err(PayoutError::not_found(id)),
        }
    }

    /// Transition a record atomically for that record
    pub fn transition(
        &self,
        id: RequestId,
        target: PayoutStatus,
        origin: TransitionOrigin,
    ) -> Result<PayoutRequest, PayoutError> {
        self.update(id, |request| {
            let from = request.status;
            if apply_transition(request, target, origin, Utc::now())? == TransitionOutcome::Applied {
                tracing::debug!(id, %from, to = %target, "transition applied");
            }
            Ok(request.clone())
        })
    }

    /// Records matching a predicate in ledger order
    fn collect_where<F>(&self, keep: F) -> Vec<PayoutRequest>
    where
        F: Fn(&PayoutRequest) -> bool,
    {
        let mut slots: Vec<Slot> = self
            .records
            .iter()
            .filter(|entry| keep(&entry.value().request))
            .map(|entry| entry.value().clone())
            .collect();
        slots.sort_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| slot.request).collect()
    }
}

impl LedgerStore for SharedLedger {
    fn find(&self, filter: &StageFilter) -> Vec<PayoutRequest> {
        self.collect_where(|request| filter.matches(request))
    }

    fn get(&self, id: RequestId) -> Option<PayoutRequest> {
        SharedLedger::get(self, id)
    }

    fn save(&mut self, request: PayoutRequest) -> PayoutRequest {
        self.insert(request)
    }

    fn all(&self) -> Vec<PayoutRequest> {
        self.collect_where(|_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Period;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn request(id: RequestId, status: PayoutStatus) -> PayoutRequest {
        PayoutRequest::new(
            id,
            Some(id % 3),
            Decimal::new(1000, 2),
            Decimal::ZERO,
            Period::new(1, 2024),
            Utc::now(),
        )
        .with_status(status)
    }

    #[test]
    fn test_find_preserves_insertion_order() {
        let ledger = SharedLedger::from_requests(
            [9, 2, 7, 4].map(|id| request(id, PayoutStatus::Pending)),
        );
        let ids: Vec<RequestId> = ledger
            .find(&StageFilter::status(PayoutStatus::Pending))
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![9, 2, 7, 4]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let ledger = SharedLedger::from_requests(vec![
            request(1, PayoutStatus::Pending),
            request(2, PayoutStatus::Pending),
        ]);
        ledger.insert(request(1, PayoutStatus::Rejected));

        let all = ledger.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, 1);
        assert_eq!(all[0].status, PayoutStatus::Rejected);
    }

    #[test]
    fn test_transition_and_not_found() {
        let ledger = SharedLedger::from_requests(vec![request(1, PayoutStatus::Pending)]);

        let updated = ledger
            .transition(1, PayoutStatus::Approved, TransitionOrigin::Operator)
            .unwrap();
        assert_eq!(updated.status, PayoutStatus::Approved);
        assert_eq!(
            ledger.transition(5, PayoutStatus::Approved, TransitionOrigin::Operator),
            Err(PayoutError::not_found(5))
        );
        assert_eq!(ledger.beneficiary_of(1), Some(Some(1)));
        assert_eq!(ledger.beneficiary_of(5), None);
    }

    #[test]
    fn test_concurrent_same_target_all_succeed() {
        use std::thread;

        let ledger = Arc::new(SharedLedger::from_requests(vec![request(
            1,
            PayoutStatus::Pending,
        )]));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    ledger.transition(1, PayoutStatus::Approved, TransitionOrigin::Operator)
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
        assert_eq!(ledger.get(1).unwrap().status, PayoutStatus::Approved);
    }
}
