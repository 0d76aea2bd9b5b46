//! Payout request types for the Payout Engine
//!
//! This module defines the ledger record (`PayoutRequest`), its lifecycle
//! status, and the billing period a request covers.

use super::error::PayoutError;
use super::payment_method::PaymentMethodSnapshot;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payout request identifier
pub type RequestId = u64;

/// Beneficiary (seller / creator) identifier
pub type BeneficiaryId = u64;

/// Lifecycle status of a payout request
///
/// The success path is `pending → approved → processing → paid`.
/// `paid`, `rejected` and `failed` are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    /// Awaiting operator review (the only status that is aggregated)
    Pending,

    /// Approved for the next payment run
    Approved,

    /// Exported to the payment provider, awaiting a completion report
    Processing,

    /// Settled by the payment provider
    Paid,

    /// The provider reported a failed transfer, or an operator failed it
    Failed,

    /// Refused by an operator
    Rejected,

    /// The provider (or export) could not resolve a payout destination
    ///
    /// Only the reconciliation codec moves a request into this status.
    PaymentMethodNotFound,
}

impl PayoutStatus {
    /// Every status, in lifecycle order
    pub const ALL: [PayoutStatus; 7] = [
        PayoutStatus::Pending,
        PayoutStatus::Approved,
        PayoutStatus::Processing,
        PayoutStatus::Paid,
        PayoutStatus::Failed,
        PayoutStatus::Rejected,
        PayoutStatus::PaymentMethodNotFound,
    ];

    /// Terminal statuses accept no further transition
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PayoutStatus::Paid | PayoutStatus::Rejected | PayoutStatus::Failed
        )
    }

    /// Wire name used in CSV files and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Approved => "approved",
            PayoutStatus::Processing => "processing",
            PayoutStatus::Paid => "paid",
            PayoutStatus::Failed => "failed",
            PayoutStatus::Rejected => "rejected",
            PayoutStatus::PaymentMethodNotFound => "payment_method_not_found",
        }
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayoutStatus {
    type Err = PayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        PayoutStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| PayoutError::ParseError {
                line: None,
                message: format!("unknown payout status '{}'", s.trim()),
            })
    }
}

/// Billing period covered by a payout request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Calendar month (1-12)
    pub month: u32,

    /// Calendar year
    pub year: i32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> Self {
        Period { month, year }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Optional month / year filter supplied by an operator
///
/// Each component is matched independently; an absent component matches
/// every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodFilter {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl PeriodFilter {
    /// A filter that matches every period
    pub fn any() -> Self {
        Self::default()
    }

    /// A filter that matches exactly one period
    pub fn exact(period: Period) -> Self {
        PeriodFilter {
            month: Some(period.month),
            year: Some(period.year),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.month.is_none() && self.year.is_none()
    }

    pub fn matches(&self, period: Period) -> bool {
        self.month.is_none_or(|month| month == period.month)
            && self.year.is_none_or(|year| year == period.year)
    }
}

/// One beneficiary's earnings for one billing period
///
/// Created upstream at `pending`; mutated only through the state machine or
/// the reconciliation import. Records are never deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutRequest {
    /// Unique, immutable identifier
    pub id: RequestId,

    /// Owning beneficiary; absent for orphaned records
    pub beneficiary_id: Option<BeneficiaryId>,

    /// `solo_amount + collab_amount` at creation time
    pub total_amount: Decimal,

    /// Earnings from solo sales
    pub solo_amount: Decimal,

    /// Earnings from collaboration splits
    pub collab_amount: Decimal,

    /// Destination captured when the request was created
    pub payout_details: Option<PaymentMethodSnapshot>,

    pub status: PayoutStatus,

    pub period: Period,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl PayoutRequest {
    /// Create a new pending request with `total = solo + collab`
    pub fn new(
        id: RequestId,
        beneficiary_id: Option<BeneficiaryId>,
        solo_amount: Decimal,
        collab_amount: Decimal,
        period: Period,
        created_at: DateTime<Utc>,
    ) -> Self {
        PayoutRequest {
            id,
            beneficiary_id,
            total_amount: solo_amount + collab_amount,
            solo_amount,
            collab_amount,
            payout_details: None,
            status: PayoutStatus::Pending,
            period,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn with_status(mut self, status: PayoutStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_payout_details(mut self, details: PaymentMethodSnapshot) -> Self {
        self.payout_details = Some(details);
        self
    }
}
