//! Reconciliation codec
//!
//! Bridges the ledger and an external, spreadsheet-based payment run:
//!
//! - **Export** turns a stage's request set into one row per request, grouped
//!   by destination type so each sheet keeps a fixed column layout.
//! - **Import** applies a provider completion report back onto the ledger.
//!   Every row is attempted; rows that cannot be matched or applied become
//!   warnings and never stop the rows after them.
//!
//! CSV layouts live in [`crate::io::csv_format`]; this module only deals in
//! typed rows.

use super::resolver::{self, Resolution};
use super::state_machine::{self, TransitionOrigin};
use super::traits::{BeneficiaryDirectory, LedgerStore};
use crate::types::{
    BeneficiaryId, PaymentMethodKind, PaymentMethodSnapshot, PayoutError, PayoutRequest,
    PayoutStatus, RequestId,
};
use rust_decimal::Decimal;

/// One exported payout line
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub request_id: RequestId,
    pub beneficiary_id: Option<BeneficiaryId>,
    /// Beneficiary display name, empty when the directory has no entry
    pub name: String,
    pub email: String,
    pub method: PaymentMethodSnapshot,
    pub total_amount: Decimal,
    pub solo_amount: Decimal,
    pub collab_amount: Decimal,
}

/// Rows ready to hand to the payment provider
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportBatch {
    /// Rows in ledger order
    pub rows: Vec<ExportRow>,
    /// Requests left out because no destination resolved
    pub unresolved: Vec<RequestId>,
}

impl ExportBatch {
    /// Rows of one destination type, ledger order
    pub fn rows_for(&self, kind: PaymentMethodKind) -> Vec<&ExportRow> {
        self.rows
            .iter()
            .filter(|row| row.method.kind() == kind)
            .collect()
    }

    pub fn exported_ids(&self) -> Vec<RequestId> {
        self.rows.iter().map(|row| row.request_id).collect()
    }
}

/// Build export rows for a request set
pub fn build_export<D>(requests: &[PayoutRequest], directory: &D) -> ExportBatch
where
    D: BeneficiaryDirectory + ?Sized,
{
    let mut batch = ExportBatch::default();

    for request in requests {
        let method = match resolver::resolve(request, directory) {
            Resolution::Resolved { method, .. } => method,
            Resolution::Unresolved => {
                batch.unresolved.push(request.id);
                continue;
            }
        };

        let identity = request.beneficiary_id.and_then(|id| directory.lookup(id));
        let (name, email) = identity
            .map(|b| (b.name, b.email))
            .unwrap_or_default();

        batch.rows.push(ExportRow {
            request_id: request.id,
            beneficiary_id: request.beneficiary_id,
            name,
            email,
            method,
            total_amount: request.total_amount,
            solo_amount: request.solo_amount,
            collab_amount: request.collab_amount,
        });
    }

    batch
}

/// Outcome reported by the payment provider for one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedOutcome {
    Paid,
    Failed,
    /// The provider could not deliver to the destination on file
    PaymentMethodNotFound,
}

impl ReportedOutcome {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "paid" | "success" | "completed" => Some(ReportedOutcome::Paid),
            "failed" => Some(ReportedOutcome::Failed),
            "payment_method_not_found" => Some(ReportedOutcome::PaymentMethodNotFound),
            _ => None,
        }
    }

    /// Ledger status this outcome moves a request to
    pub fn target_status(self) -> PayoutStatus {
        match self {
            ReportedOutcome::Paid => PayoutStatus::Paid,
            ReportedOutcome::Failed => PayoutStatus::Failed,
            ReportedOutcome::PaymentMethodNotFound => PayoutStatus::PaymentMethodNotFound,
        }
    }
}

/// One parsed completion-report row
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    /// Line number in the report (header is line 1)
    pub line: u64,
    pub request_id: RequestId,
    pub outcome: ReportedOutcome,
}

/// Result of applying a completion report
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportSummary {
    /// Rows whose transition succeeded, including idempotent re-applies
    pub applied: usize,
    /// Every row that did not apply, in report order
    pub warnings: Vec<PayoutError>,
}

impl ImportSummary {
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    /// Merge another summary into this one
    pub fn extend(&mut self, other: ImportSummary) {
        self.applied += other.applied;
        self.warnings.extend(other.warnings);
    }
}

/// Apply one report row to the ledger
///
/// # Errors
///
/// - `ImportRowMismatch` if the ledger has no request with the row's id
/// - `InvalidTransition` if the reported outcome is not reachable
pub fn apply_row<L>(ledger: &mut L, row: &ReportRow) -> Result<PayoutRequest, PayoutError>
where
    L: LedgerStore + ?Sized,
{
    if ledger.get(row.request_id).is_none() {
        return Err(PayoutError::import_row_mismatch(
            row.line,
            &row.request_id.to_string(),
        ));
    }

    state_machine::transition_as(
        ledger,
        row.request_id,
        row.outcome.target_status(),
        TransitionOrigin::Reconciliation,
    )
}

/// Apply every report row, collecting warnings instead of aborting
///
/// Rows that failed to parse arrive as `Err` and are reported as-is.
pub fn apply_report<L, I>(ledger: &mut L, rows: I) -> ImportSummary
where
    L: LedgerStore + ?Sized,
    I: IntoIterator<Item = Result<ReportRow, PayoutError>>,
{
    let mut summary = ImportSummary::default();

    for row in rows {
        match row.and_then(|row| apply_row(ledger, &row)) {
            Ok(_) => summary.applied += 1,
            Err(e) => {
                tracing::warn!(error = %e, "report row not applied");
                summary.warnings.push(e);
            }
        }
    }

    tracing::info!(
        applied = summary.applied,
        warnings = summary.warnings.len(),
        "completion report imported"
    );

    summary
}
