//! Payout Engine Library
//! # Overview
//!
//! This library implements the payout workflow for a marketplace that pays
//! its sellers and creators periodically: per-period payout requests are
//! reviewed, aggregated per beneficiary, approved, exported to a
//! spreadsheet-based payment run, and reconciled from the provider's
//! completion report.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (PayoutRequest, PayoutStatus, payment methods, errors)
//! - [`cli`] - CLI argument parsing and command dispatch
//! - [`core`] - Business logic components:
//!   - [`core::state_machine`] - Allowed status transitions
//!   - [`core::aggregation`] - Per-beneficiary payout units for review
//!   - [`core::bulk`] - Bulk transitions with per-item isolation
//!   - [`core::reconciliation`] - Export rows and report import
//!   - [`core::engine`] - Operator-facing orchestration
//! - [`io`] - CSV formats, ledger snapshot files and report readers
//! - [`strategy`] - Sync and async execution of batch operations
//!
//! # Payout Lifecycle
//!
//! ```text
//! pending → approved → processing → paid
//!    ↑                     │
//!    └──── (revert) ───────┘
//! ```
//!
//! - `pending`, `approved` and `processing` may also move to `rejected` or
//!   `failed`
//! - `paid`, `rejected` and `failed` are terminal
//! - `payment_method_not_found` is set by reconciliation only and returns to
//!   `pending`

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    BeneficiaryDirectory, BulkResult, ImportSummary, InMemoryDirectory, InMemoryLedger,
    LedgerStore, PayoutEngine, Stage, StatsSummary,
};
pub use types::{
    Beneficiary, BeneficiaryId, PaymentMethodSnapshot, PayoutError, PayoutRequest, PayoutStatus,
    Period, PeriodFilter, RequestId,
};
