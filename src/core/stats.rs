//! Summary statistics over a request set
//!
//! A pure fold over the requests passed in; no queries of its own.

use crate::types::{PayoutRequest, PayoutStatus};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Counts and totals for a request set
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatsSummary {
    pub count: usize,
    pub by_status: BTreeMap<PayoutStatus, usize>,
    pub total_amount: Decimal,
    pub solo_amount: Decimal,
    pub collab_amount: Decimal,
    /// `total_amount / count`, zero for an empty set
    pub average_amount: Decimal,
}

impl StatsSummary {
    pub fn count_for(&self, status: PayoutStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Compute the summary for a request set
pub fn summarize<'a, I>(requests: I) -> StatsSummary
where
    I: IntoIterator<Item = &'a PayoutRequest>,
{
    let mut summary = requests
        .into_iter()
        .fold(StatsSummary::default(), |mut acc, request| {
            acc.count += 1;
            *acc.by_status.entry(request.status).or_insert(0) += 1;
            acc.total_amount += request.total_amount;
            acc.solo_amount += request.solo_amount;
            acc.collab_amount += request.collab_amount;
            acc
        });

    if summary.count > 0 {
        summary.average_amount = summary.total_amount / Decimal::from(summary.count);
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Period;
    use chrono::Utc;

    fn request(id: u64, cents: i64, status: PayoutStatus) -> PayoutRequest {
        PayoutRequest::new(
            id,
            Some(1),
            Decimal::new(cents, 2),
            Decimal::new(100, 2),
            Period::new(1, 2024),
            Utc::now(),
        )
        .with_status(status)
    }

    #[test]
    fn test_summary_counts_and_totals() {
        let requests = vec![
            request(1, 2900, PayoutStatus::Pending),
            request(2, 1900, PayoutStatus::Pending),
            request(3, 900, PayoutStatus::Paid),
        ];

        let summary = summarize(&requests);

        assert_eq!(summary.count, 3);
        assert_eq!(summary.count_for(PayoutStatus::Pending), 2);
        assert_eq!(summary.count_for(PayoutStatus::Paid), 1);
        assert_eq!(summary.count_for(PayoutStatus::Failed), 0);
        assert_eq!(summary.total_amount, Decimal::new(6000, 2));
        assert_eq!(summary.solo_amount, Decimal::new(5700, 2));
        assert_eq!(summary.collab_amount, Decimal::new(300, 2));
        assert_eq!(summary.average_amount, Decimal::new(2000, 2));
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&Vec::<PayoutRequest>::new());
        assert_eq!(summary, StatsSummary::default());
        assert_eq!(summary.average_amount, Decimal::ZERO);
    }
}
