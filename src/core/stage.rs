//! Stage classification
//!
//! Translates an operator-chosen pipeline stage into a ledger query.
//! Unpaid requests carry over between billing periods, so every stage except
//! `history` drops the period filter.

use crate::types::{PayoutError, PayoutRequest, PayoutStatus, PeriodFilter};
use std::fmt;
use std::str::FromStr;

/// Operator-facing pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Pending requests, aggregated per beneficiary
    Review,
    Approved,
    Processing,
    /// Settled (`paid`) requests, browsable by period
    History,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Review, Stage::Approved, Stage::Processing, Stage::History];

    /// Status listed by this stage
    pub fn status(self) -> PayoutStatus {
        match self {
            Stage::Review => PayoutStatus::Pending,
            Stage::Approved => PayoutStatus::Approved,
            Stage::Processing => PayoutStatus::Processing,
            Stage::History => PayoutStatus::Paid,
        }
    }

    /// Whether an operator period filter is honored for this stage
    pub fn includes_period(self) -> bool {
        matches!(self, Stage::History)
    }

    /// Build the ledger filter for this stage
    ///
    /// The supplied period is discarded for every stage that does not
    /// include periods.
    pub fn filter(self, period: PeriodFilter) -> StageFilter {
        let include_period = self.includes_period();
        StageFilter {
            status: self.status(),
            include_period,
            period: if include_period {
                period
            } else {
                PeriodFilter::any()
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Review => "review",
            Stage::Approved => "approved",
            Stage::Processing => "processing",
            Stage::History => "history",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = PayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| PayoutError::parse_error(None, &format!("unknown stage '{}'", s.trim())))
    }
}

/// Ledger query predicate for one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageFilter {
    pub status: PayoutStatus,
    pub include_period: bool,
    pub period: PeriodFilter,
}

impl StageFilter {
    /// Filter on status alone
    pub fn status(status: PayoutStatus) -> Self {
        StageFilter {
            status,
            include_period: false,
            period: PeriodFilter::any(),
        }
    }

    pub fn matches(&self, request: &PayoutRequest) -> bool {
        request.status == self.status
            && (!self.include_period || self.period.matches(request.period))
    }
}
