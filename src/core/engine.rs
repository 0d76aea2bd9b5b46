//! Payout workflow engine
//!
//! This module provides the `PayoutEngine`, the operator-facing entry point
//! that coordinates the ledger store, beneficiary directory, state machine,
//! aggregation, reconciliation and stats components.
//!
//! Control flow for a listing: stage → filter → ledger → (review only)
//! aggregation → payment-method annotation. Mutations go through the state
//! machine or the reconciliation import, one ledger write per request.

use super::aggregation::{self, AggregatedPayoutUnit, AggregationOutcome};
use super::bulk::{self, BulkResult};
use super::reconciliation::{self, ExportBatch, ImportSummary, ReportRow};
use super::resolver::{self, Resolution};
use super::stage::Stage;
use super::state_machine::{self, TransitionOrigin};
use super::stats::{self, StatsSummary};
use super::traits::{BeneficiaryDirectory, LedgerStore};
use crate::types::{BeneficiaryId, PayoutError, PayoutRequest, PayoutStatus, PeriodFilter, RequestId};

/// A request together with its effective destination
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRequest {
    pub request: PayoutRequest,
    pub payment_method: Resolution,
}

/// An aggregated unit together with its effective destination
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedUnit {
    pub unit: AggregatedPayoutUnit,
    pub payment_method: Resolution,
}

/// Result of listing a stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageListing {
    /// Review stage: one unit per beneficiary, plus unaggregated orphans
    Units {
        units: Vec<AnnotatedUnit>,
        orphaned: Vec<AnnotatedRequest>,
    },
    /// Every other stage: raw requests
    Requests(Vec<AnnotatedRequest>),
}

/// Result of an export run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportRun {
    pub batch: ExportBatch,
    /// Exported requests moved `approved → processing`
    pub advanced: BulkResult,
    /// Unresolved requests moved to `payment_method_not_found`
    pub flagged: BulkResult,
}

/// Payout workflow engine
///
/// Owns a ledger store and a beneficiary directory. Generic over both so the
/// same engine runs on the in-memory ledger and the shared concurrent one.
pub struct PayoutEngine<L, D> {
    ledger: L,
    directory: D,
}

impl<L, D> PayoutEngine<L, D>
where
    L: LedgerStore,
    D: BeneficiaryDirectory,
{
    pub fn new(ledger: L, directory: D) -> Self {
        PayoutEngine { ledger, directory }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Release the ledger, e.g. to persist it
    pub fn into_ledger(self) -> L {
        self.ledger
    }

    /// Requests visible in a stage
    ///
    /// The period filter only applies to `history`.
    pub fn stage_requests(&self, stage: Stage, period: PeriodFilter) -> Vec<PayoutRequest> {
        self.ledger.find(&stage.filter(period))
    }

    /// Aggregated review units for the current pending set
    pub fn review_units(&self) -> AggregationOutcome {
        let pending = self.stage_requests(Stage::Review, PeriodFilter::any());
        aggregation::aggregate(&pending)
    }

    /// List a stage, annotated with payment methods
    pub fn list_stage(&self, stage: Stage, period: PeriodFilter) -> StageListing {
        let requests = self.stage_requests(stage, period);

        if stage != Stage::Review {
            return StageListing::Requests(
                requests.into_iter().map(|r| self.annotate(r)).collect(),
            );
        }

        let outcome = aggregation::aggregate(&requests);
        let units = outcome
            .units
            .into_iter()
            .map(|unit| {
                // A unit pays out to its first member's destination
                let payment_method = unit
                    .member_request_ids
                    .first()
                    .and_then(|id| requests.iter().find(|r| r.id == *id))
                    .map_or(Resolution::Unresolved, |r| {
                        resolver::resolve(r, &self.directory)
                    });
                AnnotatedUnit {
                    unit,
                    payment_method,
                }
            })
            .collect();
        let orphaned = requests
            .into_iter()
            .filter(|r| outcome.orphaned.contains(&r.id))
            .map(|r| self.annotate(r))
            .collect();

        StageListing::Units { units, orphaned }
    }

    /// Pair a request with its effective destination
    pub fn annotate(&self, request: PayoutRequest) -> AnnotatedRequest {
        let payment_method = resolver::resolve(&request, &self.directory);
        AnnotatedRequest {
            request,
            payment_method,
        }
    }

    /// Transition one request
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown id
    /// - `InvalidTransition` for an edge outside the graph
    /// - `UnresolvedPaymentMethod` when moving a request into `processing`
    ///   while neither it nor the directory carries a destination
    pub fn transition(
        &mut self,
        id: RequestId,
        target: PayoutStatus,
    ) -> Result<PayoutRequest, PayoutError> {
        let current = self.ledger.get(id).ok_or_else(|| PayoutError::not_found(id))?;
        if target == PayoutStatus::Processing
            && state_machine::is_allowed_transition(current.status, target, TransitionOrigin::Operator)
        {
            resolver::require(&current, &self.directory)?;
        }
        state_machine::transition(&mut self.ledger, id, target)
    }

    /// Revert one `processing` or `payment_method_not_found` request to `pending`
    pub fn revert(&mut self, id: RequestId) -> Result<PayoutRequest, PayoutError> {
        state_machine::revert(&mut self.ledger, id)
    }

    /// Transition many requests with per-item isolation
    pub fn bulk_transition(&mut self, ids: &[RequestId], target: PayoutStatus) -> BulkResult {
        bulk::bulk_transition(&mut self.ledger, ids, target)
    }

    /// Apply a unit-level action to each member request
    pub fn unit_transition(
        &mut self,
        unit: &AggregatedPayoutUnit,
        target: PayoutStatus,
    ) -> BulkResult {
        self.bulk_transition(&unit.member_request_ids, target)
    }

    /// Approve a beneficiary's current pending unit
    ///
    /// # Errors
    ///
    /// `UnitNotFound` if the beneficiary has no pending unit.
    pub fn approve_unit(&mut self, beneficiary: BeneficiaryId) -> Result<BulkResult, PayoutError> {
        let outcome = self.review_units();
        let unit = outcome
            .unit_for(beneficiary)
            .ok_or(PayoutError::UnitNotFound { beneficiary })?;
        Ok(self.unit_transition(unit, PayoutStatus::Approved))
    }

    /// Export a stage for the payment provider
    ///
    /// With `advance` set on the `approved` stage, exported requests move to
    /// `processing` and unresolved ones are flagged
    /// `payment_method_not_found`.
    pub fn export_batch(&mut self, stage: Stage, period: PeriodFilter, advance: bool) -> ExportRun {
        let requests = self.stage_requests(stage, period);
        let batch = reconciliation::build_export(&requests, &self.directory);
        let mut run = ExportRun::default();

        if advance && stage == Stage::Approved {
            run.advanced = bulk::bulk_transition_as(
                &mut self.ledger,
                &batch.exported_ids(),
                PayoutStatus::Processing,
                TransitionOrigin::Operator,
            );
            run.flagged = bulk::bulk_transition_as(
                &mut self.ledger,
                &batch.unresolved,
                PayoutStatus::PaymentMethodNotFound,
                TransitionOrigin::Reconciliation,
            );
        }

        tracing::info!(
            %stage,
            exported = batch.rows.len(),
            unresolved = batch.unresolved.len(),
            "export batch built"
        );

        run.batch = batch;
        run
    }

    /// Apply a completion report
    pub fn import_report<I>(&mut self, rows: I) -> ImportSummary
    where
        I: IntoIterator<Item = Result<ReportRow, PayoutError>>,
    {
        reconciliation::apply_report(&mut self.ledger, rows)
    }

    /// Summary statistics for a stage
    pub fn stats(&self, stage: Stage, period: PeriodFilter) -> StatsSummary {
        stats::summarize(&self.stage_requests(stage, period))
    }
}
