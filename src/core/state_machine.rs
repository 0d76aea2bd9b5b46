//! Payout request state machine
//!
//! Enforces the transition graph and applies one transition to one request.
//!
//! ```text
//! pending ──► approved ──► processing ──► paid
//!    ▲                         │
//!    └──────── revert ─────────┘
//!
//! pending | approved | processing ──► rejected | failed
//! approved | processing ──► payment_method_not_found   (reconciliation only)
//! payment_method_not_found ──► pending                 (revert)
//! ```
//!
//! Transitions are optimistic: the edge is checked against the status read at
//! call time and the write is last-one-wins. A transition to the status the
//! request already has is a successful no-op, which lets bulk runs and report
//! imports be retried safely.

use super::traits::LedgerStore;
use crate::types::{PayoutError, PayoutRequest, PayoutStatus, RequestId};
use chrono::{DateTime, Utc};

/// Who is asking for a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOrigin {
    /// An operator or automation acting through the engine
    Operator,
    /// The reconciliation codec applying a provider outcome
    Reconciliation,
}

/// Result of applying a transition to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Status and `updated_at` were changed
    Applied,
    /// The record already had the target status
    Unchanged,
}

/// Whether `from → to` is an edge of the graph for the given origin
///
/// Self-edges are not edges; callers treat them as no-ops before asking.
pub fn is_allowed_transition(
    from: PayoutStatus,
    to: PayoutStatus,
    origin: TransitionOrigin,
) -> bool {
    use PayoutStatus::*;

    if from.is_terminal() {
        return false;
    }

    match (from, to) {
        (Pending, Approved) | (Approved, Processing) | (Processing, Paid) => true,
        (Processing, Pending) | (PaymentMethodNotFound, Pending) => true,
        (Pending | Approved | Processing, Rejected | Failed) => true,
        (Approved | Processing, PaymentMethodNotFound) => {
            origin == TransitionOrigin::Reconciliation
        }
        _ => false,
    }
}

/// Apply a transition to a record in place
///
/// # Errors
///
/// `InvalidTransition` when the edge does not exist, including every attempt
/// to leave a terminal status.
pub fn apply_transition(
    request: &mut PayoutRequest,
    target: PayoutStatus,
    origin: TransitionOrigin,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, PayoutError> {
    if request.status == target {
        return Ok(TransitionOutcome::Unchanged);
    }

    if !is_allowed_transition(request.status, target, origin) {
        return Err(PayoutError::invalid_transition(
            request.id,
            request.status,
            target,
        ));
    }

    request.status = target;
    request.updated_at = now;
    Ok(TransitionOutcome::Applied)
}

/// Transition a ledger record on behalf of an operator
///
/// # Errors
///
/// - `NotFound` if the id is unknown
/// - `InvalidTransition` if the edge is not permitted from the current status
pub fn transition<L>(
    ledger: &mut L,
    id: RequestId,
    target: PayoutStatus,
) -> Result<PayoutRequest, PayoutError>
where
    L: LedgerStore + ?Sized,
{
    transition_as(ledger, id, target, TransitionOrigin::Operator)
}

/// Transition a ledger record with an explicit origin
pub fn transition_as<L>(
    ledger: &mut L,
    id: RequestId,
    target: PayoutStatus,
    origin: TransitionOrigin,
) -> Result<PayoutRequest, PayoutError>
where
    L: LedgerStore + ?Sized,
{
    let mut request = ledger.get(id).ok_or_else(|| PayoutError::not_found(id))?;
    let from = request.status;

    match apply_transition(&mut request, target, origin, Utc::now()) {
        Ok(TransitionOutcome::Applied) => {
            tracing::debug!(id, %from, to = %target, "transition applied");
            Ok(ledger.save(request))
        }
        Ok(TransitionOutcome::Unchanged) => Ok(request),
        Err(e) => {
            tracing::debug!(id, %from, to = %target, "transition rejected");
            Err(e)
        }
    }
}

/// Revert a `processing` or `payment_method_not_found` request to `pending`
///
/// Succeeds as a no-op when the request is already `pending`; any other
/// current status is an `InvalidTransition`.
pub fn revert<L>(ledger: &mut L, id: RequestId) -> Result<PayoutRequest, PayoutError>
where
    L: LedgerStore + ?Sized,
{
    let current = ledger.get(id).ok_or_else(|| PayoutError::not_found(id))?;

    match current.status {
        PayoutStatus::Processing | PayoutStatus::PaymentMethodNotFound | PayoutStatus::Pending => {
            transition(ledger, id, PayoutStatus::Pending)
        }
        other => Err(PayoutError::invalid_transition(
            id,
            other,
            PayoutStatus::Pending,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::InMemoryLedger;
    use crate::types::Period;
    use rstest::rstest;
    use rust_decimal::Decimal;

    fn ledger_with(status: PayoutStatus) -> InMemoryLedger {
        let created = Utc::now() - chrono::Duration::days(1);
        InMemoryLedger::from_requests(vec![PayoutRequest::new(
            1,
            Some(10),
            Decimal::new(3000, 2),
            Decimal::ZERO,
            Period::new(1, 2024),
            created,
        )
        .with_status(status)])
    }

    #[rstest]
    #[case::approve(PayoutStatus::Pending, PayoutStatus::Approved)]
    #[case::process(PayoutStatus::Approved, PayoutStatus::Processing)]
    #[case::pay(PayoutStatus::Processing, PayoutStatus::Paid)]
    #[case::revert(PayoutStatus::Processing, PayoutStatus::Pending)]
    #[case::reject_pending(PayoutStatus::Pending, PayoutStatus::Rejected)]
    #[case::fail_approved(PayoutStatus::Approved, PayoutStatus::Failed)]
    #[case::fail_processing(PayoutStatus::Processing, PayoutStatus::Failed)]
    #[case::reenter_pending(PayoutStatus::PaymentMethodNotFound, PayoutStatus::Pending)]
    fn test_allowed_edges(#[case] from: PayoutStatus, #[case] to: PayoutStatus) {
        let mut ledger = ledger_with(from);
        let before = ledger.get(1).unwrap().updated_at;

        let updated = transition(&mut ledger, 1, to).unwrap();

        assert_eq!(updated.status, to);
        assert!(updated.updated_at > before);
        assert_eq!(ledger.get(1).unwrap().status, to);
    }

    #[rstest]
    #[case::skip_approval(PayoutStatus::Pending, PayoutStatus::Paid)]
    #[case::skip_processing(PayoutStatus::Approved, PayoutStatus::Paid)]
    #[case::approved_back(PayoutStatus::Approved, PayoutStatus::Pending)]
    #[case::operator_flag(PayoutStatus::Processing, PayoutStatus::PaymentMethodNotFound)]
    #[case::not_found_to_approved(PayoutStatus::PaymentMethodNotFound, PayoutStatus::Approved)]
    fn test_rejected_edges(#[case] from: PayoutStatus, #[case] to: PayoutStatus) {
        let mut ledger = ledger_with(from);

        let err = transition(&mut ledger, 1, to).unwrap_err();

        assert_eq!(err, PayoutError::invalid_transition(1, from, to));
        assert_eq!(ledger.get(1).unwrap().status, from);
    }

    #[rstest]
    fn test_terminal_statuses_reject_every_other_target(
        #[values(PayoutStatus::Paid, PayoutStatus::Rejected, PayoutStatus::Failed)]
        terminal: PayoutStatus,
    ) {
        for target in PayoutStatus::ALL.into_iter().filter(|s| *s != terminal) {
            for origin in [TransitionOrigin::Operator, TransitionOrigin::Reconciliation] {
                let mut ledger = ledger_with(terminal);
                let err = transition_as(&mut ledger, 1, target, origin).unwrap_err();
                assert!(matches!(err, PayoutError::InvalidTransition { .. }));
            }
        }
    }

    #[test]
    fn test_same_target_is_idempotent() {
        let mut ledger = ledger_with(PayoutStatus::Pending);

        let first = transition(&mut ledger, 1, PayoutStatus::Approved).unwrap();
        let second = transition(&mut ledger, 1, PayoutStatus::Approved).unwrap();

        assert_eq!(first, second);
        assert_eq!(ledger.get(1).unwrap(), first);
    }

    #[test]
    fn test_terminal_same_target_is_noop() {
        let mut ledger = ledger_with(PayoutStatus::Paid);
        let before = ledger.get(1).unwrap();

        let after = transition(&mut ledger, 1, PayoutStatus::Paid).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let mut ledger = ledger_with(PayoutStatus::Pending);
        let err = transition(&mut ledger, 99, PayoutStatus::Approved).unwrap_err();
        assert_eq!(err, PayoutError::not_found(99));
    }

    #[test]
    fn test_reconciliation_can_flag_missing_method() {
        let mut ledger = ledger_with(PayoutStatus::Processing);
        let updated = transition_as(
            &mut ledger,
            1,
            PayoutStatus::PaymentMethodNotFound,
            TransitionOrigin::Reconciliation,
        )
        .unwrap();
        assert_eq!(updated.status, PayoutStatus::PaymentMethodNotFound);
    }

    #[rstest]
    #[case::from_processing(PayoutStatus::Processing, true)]
    #[case::already_pending(PayoutStatus::Pending, true)]
    #[case::from_approved(PayoutStatus::Approved, false)]
    #[case::from_not_found(PayoutStatus::PaymentMethodNotFound, true)]
    #[case::from_paid(PayoutStatus::Paid, false)]
    fn test_revert(#[case] from: PayoutStatus, #[case] ok: bool) {
        let mut ledger = ledger_with(from);
        let result = revert(&mut ledger, 1);
        assert_eq!(result.is_ok(), ok);
        if ok {
            assert_eq!(ledger.get(1).unwrap().status, PayoutStatus::Pending);
        } else {
            assert_eq!(
                result.unwrap_err(),
                PayoutError::invalid_transition(1, from, PayoutStatus::Pending)
            );
        }
    }

    #[test]
    fn test_apply_transition_leaves_record_on_error() {
        let mut request = ledger_with(PayoutStatus::Rejected).get(1).unwrap();
        let snapshot = request.clone();
        let result = apply_transition(
            &mut request,
            PayoutStatus::Pending,
            TransitionOrigin::Operator,
            Utc::now(),
        );
        assert!(result.is_err());
        assert_eq!(request, snapshot);
    }
}
