//! In-memory beneficiary directory

use super::traits::BeneficiaryDirectory;
use crate::types::{Beneficiary, BeneficiaryId};
use std::collections::HashMap;

/// Beneficiary directory backed by a HashMap
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    beneficiaries: HashMap<BeneficiaryId, Beneficiary>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_beneficiaries<I>(beneficiaries: I) -> Self
    where
        I: IntoIterator<Item = Beneficiary>,
    {
        InMemoryDirectory {
            beneficiaries: beneficiaries.into_iter().map(|b| (b.id, b)).collect(),
        }
    }

    pub fn insert(&mut self, beneficiary: Beneficiary) {
        self.beneficiaries.insert(beneficiary.id, beneficiary);
    }

    pub fn len(&self) -> usize {
        self.beneficiaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beneficiaries.is_empty()
    }
}

impl BeneficiaryDirectory for InMemoryDirectory {
    fn lookup(&self, id: BeneficiaryId) -> Option<Beneficiary> {
        self.beneficiaries.get(&id).cloned()
    }
}
