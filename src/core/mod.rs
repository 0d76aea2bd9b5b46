//! Core business logic module
//!
//! This module contains the payout workflow components:
//! - `traits` - Storage and directory abstractions
//! - `ledger` / `directory` - In-memory implementations of those traits
//! - `stage` - Workflow stages and their ledger filters
//! - `state_machine` - Allowed status transitions and the transition operation
//! - `aggregation` - Grouping pending requests into per-beneficiary units
//! - `bulk` - Bulk transitions with per-item isolation
//! - `resolver` - Effective payment method resolution
//! - `reconciliation` - Export rows and completion-report import
//! - `stats` - Counts and totals for a request set
//! - `engine` - Orchestration of all of the above
//! - `async` - Concurrent implementations

pub mod aggregation;
pub mod r#async;
pub mod bulk;
pub mod directory;
pub mod engine;
pub mod ledger;
pub mod reconciliation;
pub mod resolver;
pub mod stage;
pub mod state_machine;
pub mod stats;
pub mod traits;

pub use aggregation::{aggregate, AggregatedPayoutUnit, AggregationOutcome};
pub use bulk::{BulkFailure, BulkResult};
pub use directory::InMemoryDirectory;
pub use engine::{AnnotatedRequest, AnnotatedUnit, ExportRun, PayoutEngine, StageListing};
pub use ledger::InMemoryLedger;
pub use r#async::{BulkProcessor, SharedLedger};
pub use reconciliation::{ExportBatch, ExportRow, ImportSummary, ReportRow, ReportedOutcome};
pub use resolver::{MethodSource, Resolution};
pub use stage::{Stage, StageFilter};
pub use state_machine::{TransitionOrigin, TransitionOutcome};
pub use stats::StatsSummary;
pub use traits::{BeneficiaryDirectory, LedgerStore};
