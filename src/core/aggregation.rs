//! Pending-request aggregation
//!
//! Groups the pending request set into one payable unit per beneficiary.
//! Aggregation is a pure projection: it reads a slice of requests and returns
//! new immutable records, never touching the ledger. For a fixed input the
//! output is identical on every call, ordered by each beneficiary's first
//! request in the input.
//!
//! # Guarantees
//!
//! - Every pending request with a beneficiary lands in exactly one unit
//! - Pending requests without a beneficiary are listed in `orphaned`
//! - Units always have at least one member
//!
//! Grouping depends on the ledger alone. A beneficiary missing from the
//! directory still gets a unit; the directory only annotates it.

use crate::types::{BeneficiaryId, PayoutRequest, PayoutStatus, Period, RequestId};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// One beneficiary's pending requests shown as a single payable line
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedPayoutUnit {
    pub beneficiary_id: BeneficiaryId,
    pub total_amount: Decimal,
    pub solo_amount: Decimal,
    pub collab_amount: Decimal,
    /// Distinct periods, first-seen order
    pub periods: Vec<Period>,
    /// Underlying request ids, encounter order
    pub member_request_ids: Vec<RequestId>,
}

impl AggregatedPayoutUnit {
    fn seed(beneficiary_id: BeneficiaryId) -> Self {
        AggregatedPayoutUnit {
            beneficiary_id,
            total_amount: Decimal::ZERO,
            solo_amount: Decimal::ZERO,
            collab_amount: Decimal::ZERO,
            periods: Vec::new(),
            member_request_ids: Vec::new(),
        }
    }

    fn absorb(&mut self, request: &PayoutRequest) {
        self.total_amount += request.total_amount;
        self.solo_amount += request.solo_amount;
        self.collab_amount += request.collab_amount;
        if !self.periods.contains(&request.period) {
            self.periods.push(request.period);
        }
        self.member_request_ids.push(request.id);
    }

    pub fn member_count(&self) -> usize {
        self.member_request_ids.len()
    }
}

/// Result of aggregating a request set
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregationOutcome {
    pub units: Vec<AggregatedPayoutUnit>,
    /// Pending requests with no beneficiary
    pub orphaned: Vec<RequestId>,
}

impl AggregationOutcome {
    pub fn unit_for(&self, beneficiary_id: BeneficiaryId) -> Option<&AggregatedPayoutUnit> {
        self.units
            .iter()
            .find(|unit| unit.beneficiary_id == beneficiary_id)
    }
}

/// Aggregate pending requests per beneficiary
///
/// Requests in any status other than `pending` are not part of the review
/// projection and are skipped.
pub fn aggregate(requests: &[PayoutRequest]) -> AggregationOutcome {
    let mut units: Vec<AggregatedPayoutUnit> = Vec::new();
    let mut positions: HashMap<BeneficiaryId, usize> = HashMap::new();
    let mut orphaned = Vec::new();

    for request in requests {
        if request.status != PayoutStatus::Pending {
            continue;
        }

        let Some(beneficiary_id) = request.beneficiary_id else {
            orphaned.push(request.id);
            continue;
        };

        let pos = *positions.entry(beneficiary_id).or_insert_with(|| {
            units.push(AggregatedPayoutUnit::seed(beneficiary_id));
            units.len() - 1
        });
        units[pos].absorb(request);
    }

    if !orphaned.is_empty() {
        tracing::warn!(
            count = orphaned.len(),
            "pending requests without a beneficiary"
        );
    }

    AggregationOutcome { units, orphaned }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pending(
        id: RequestId,
        beneficiary: Option<BeneficiaryId>,
        solo_cents: i64,
        collab_cents: i64,
        month: u32,
    ) -> PayoutRequest {
        PayoutRequest::new(
            id,
            beneficiary,
            Decimal::new(solo_cents, 2),
            Decimal::new(collab_cents, 2),
            Period::new(month, 2024),
            Utc::now(),
        )
    }

    #[test]
    fn test_two_periods_merge_into_one_unit() {
        let requests = vec![pending(1, Some(7), 3000, 0, 1), pending(2, Some(7), 2000, 0, 2)];

        let outcome = aggregate(&requests);

        assert_eq!(outcome.units.len(), 1);
        let unit = &outcome.units[0];
        assert_eq!(unit.beneficiary_id, 7);
        assert_eq!(unit.total_amount, Decimal::new(5000, 2));
        assert_eq!(unit.periods, vec![Period::new(1, 2024), Period::new(2, 2024)]);
        assert_eq!(unit.member_request_ids, vec![1, 2]);
    }

    #[test]
    fn test_single_request_is_single_member_unit() {
        let outcome = aggregate(&[pending(1, Some(3), 100, 50, 4)]);
        assert_eq!(outcome.units.len(), 1);
        assert_eq!(outcome.units[0].member_count(), 1);
        assert_eq!(outcome.units[0].solo_amount, Decimal::new(100, 2));
        assert_eq!(outcome.units[0].collab_amount, Decimal::new(50, 2));
        assert_eq!(outcome.units[0].total_amount, Decimal::new(150, 2));
    }

    #[test]
    fn test_units_partition_pending_requests() {
        let requests = vec![
            pending(1, Some(2), 100, 0, 1),
            pending(2, Some(1), 200, 0, 1),
            pending(3, Some(2), 300, 10, 2),
            pending(4, Some(1), 400, 0, 1),
            pending(5, Some(3), 500, 0, 3),
        ];

        let outcome = aggregate(&requests);

        let order: Vec<BeneficiaryId> = outcome.units.iter().map(|u| u.beneficiary_id).collect();
        assert_eq!(order, vec![2, 1, 3]);

        let mut members: Vec<RequestId> = outcome
            .units
            .iter()
            .flat_map(|u| u.member_request_ids.iter().copied())
            .collect();
        members.sort_unstable();
        assert_eq!(members, vec![1, 2, 3, 4, 5]);

        for unit in &outcome.units {
            let expected: Decimal = requests
                .iter()
                .filter(|r| r.beneficiary_id == Some(unit.beneficiary_id))
                .map(|r| r.total_amount)
                .sum();
            assert_eq!(unit.total_amount, expected);
        }
    }

    #[test]
    fn test_duplicate_periods_are_collapsed() {
        let requests = vec![
            pending(1, Some(1), 100, 0, 5),
            pending(2, Some(1), 100, 0, 3),
            pending(3, Some(1), 100, 0, 5),
        ];
        let outcome = aggregate(&requests);
        assert_eq!(
            outcome.units[0].periods,
            vec![Period::new(5, 2024), Period::new(3, 2024)]
        );
        assert_eq!(outcome.units[0].member_request_ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_orphans_are_reported_not_dropped() {
        let requests = vec![
            pending(1, None, 100, 0, 1),
            pending(2, Some(99), 100, 0, 1),
            pending(3, Some(1), 100, 0, 1),
            pending(4, None, 100, 0, 2),
        ];

        let outcome = aggregate(&requests);

        assert_eq!(outcome.orphaned, vec![1, 4]);
        let order: Vec<BeneficiaryId> = outcome.units.iter().map(|u| u.beneficiary_id).collect();
        assert_eq!(order, vec![99, 1]);
    }

    #[test]
    fn test_non_pending_requests_are_skipped() {
        let requests = vec![
            pending(1, Some(1), 100, 0, 1).with_status(PayoutStatus::Approved),
            pending(2, Some(1), 100, 0, 1),
        ];
        let outcome = aggregate(&requests);
        assert_eq!(outcome.units[0].member_request_ids, vec![2]);
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let requests: Vec<PayoutRequest> = (1..=40)
            .map(|id| pending(id, Some(id % 7), id as i64 * 10, 0, (id % 12 + 1) as u32))
            .collect();

        let first = aggregate(&requests);
        let second = aggregate(&requests);

        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input_produces_no_units() {
        let outcome = aggregate(&[]);
        assert!(outcome.units.is_empty());
        assert!(outcome.orphaned.is_empty());
        assert!(outcome.unit_for(1).is_none());
    }
}
