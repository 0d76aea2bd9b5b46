//! Core traits for ledger storage and beneficiary lookup
//!
//! These are the seams to the engine's external collaborators. The engine
//! only ever reads through `find` / `get` and writes through `save`, so an
//! in-memory map, a shared concurrent map, or a database table can stand in.

use super::stage::StageFilter;
use crate::types::{Beneficiary, BeneficiaryId, PaymentMethodSnapshot, PayoutRequest, RequestId};

/// Durable store of payout requests
pub trait LedgerStore {
    /// All requests matching the filter, in ledger order
    fn find(&self, filter: &StageFilter) -> Vec<PayoutRequest>;

    /// Get a request by id
    fn get(&self, id: RequestId) -> Option<PayoutRequest>;

    /// Insert or replace a request, returning the stored record
    fn save(&mut self, request: PayoutRequest) -> PayoutRequest;

    /// Every request in ledger order
    fn all(&self) -> Vec<PayoutRequest>;
}

/// Directory of beneficiaries and their default payment methods
pub trait BeneficiaryDirectory {
    /// Look up a beneficiary's identity
    fn lookup(&self, id: BeneficiaryId) -> Option<Beneficiary>;

    /// The beneficiary's default payment method on file
    fn get_default_payment_method(&self, id: BeneficiaryId) -> Option<PaymentMethodSnapshot> {
        self.lookup(id).and_then(|beneficiary| beneficiary.default_method)
    }
}
