//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `payout`: Payout requests, statuses and billing periods
//! - `payment_method`: Payout destinations and directory entries
//! - `error`: Error types for the payout engine

pub mod error;
pub mod payment_method;
pub mod payout;

pub use error::PayoutError;
pub use payment_method::{
    BankDestination, Beneficiary, MobileMoneyDestination, PayPalDestination, PaymentMethodKind,
    PaymentMethodSnapshot,
};
pub use payout::{BeneficiaryId, PayoutRequest, PayoutStatus, Period, PeriodFilter, RequestId};
