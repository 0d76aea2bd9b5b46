//! In-memory payout ledger
//!
//! This module provides the `InMemoryLedger`, the single-threaded
//! `LedgerStore` used by the sync strategy and the CLI. Records keep the
//! order in which they were first inserted so that every `find` returns the
//! same sequence for an unchanged ledger.
//!
//! # Duplicate Handling
//!
//! `save` replaces an existing record in place; its ledger position does not
//! change.

use super::stage::StageFilter;
use super::traits::LedgerStore;
use crate::types::{PayoutRequest, RequestId};
use std::collections::HashMap;

/// Ordered in-memory ledger
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    /// Records in insertion order
    records: Vec<PayoutRequest>,

    /// Request id to position in `records`
    index: HashMap<RequestId, usize>,
}

impl InMemoryLedger {
    /// Create a new empty ledger
    pub fn new() -> Self {
        InMemoryLedger {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a ledger from records in order
    ///
    /// A later record with an already-seen id replaces the earlier one.
    pub fn from_requests<I>(requests: I) -> Self
    where
        I: IntoIterator<Item = PayoutRequest>,
    {
        let mut ledger = InMemoryLedger::new();
        for request in requests {
            ledger.save(request);
        }
        ledger
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the ledger, returning records in ledger order
    pub fn into_requests(self) -> Vec<PayoutRequest> {
        self.records
    }
}

impl LedgerStore for InMemoryLedger {
    fn find(&self, filter: &StageFilter) -> Vec<PayoutRequest> {
        self.records
            .iter()
            .filter(|request| filter.matches(request))
            .cloned()
            .collect()
    }

    fn get(&self, id: RequestId) -> Option<PayoutRequest> {
        self.index.get(&id).map(|&pos| self.records[pos].clone())
    }

    fn save(&mut self, request: PayoutRequest) -> PayoutRequest {
        match self.index.get(&request.id) {
            Some(&pos) => self.records[pos] = request.clone(),
            None => {
                self.index.insert(request.id, self.records.len());
                self.records.push(request.clone());
            }
        }
        request
    }

    fn all(&self) -> Vec<PayoutRequest> {
        self.records.clone()
    }
}
