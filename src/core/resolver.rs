//! Payment method resolution
//!
//! Computes the effective payout destination for a request at read time.
//! Precedence: the request's own `payout_details`, then the beneficiary's
//! default method on file, then unresolved. Resolution never mutates the
//! request.

use super::traits::BeneficiaryDirectory;
use crate::types::{PaymentMethodSnapshot, PayoutError, PayoutRequest};

/// Where a resolved destination came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodSource {
    /// Captured on the request at creation time
    RequestDetails,
    /// Beneficiary's default on file
    DirectoryDefault,
}

/// Effective destination for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved {
        method: PaymentMethodSnapshot,
        source: MethodSource,
    },
    Unresolved,
}

impl Resolution {
    pub fn method(&self) -> Option<&PaymentMethodSnapshot> {
        match self {
            Resolution::Resolved { method, .. } => Some(method),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }
}

/// Resolve the destination for a request
pub fn resolve<D>(request: &PayoutRequest, directory: &D) -> Resolution
where
    D: BeneficiaryDirectory + ?Sized,
{
    if let Some(details) = &request.payout_details {
        return Resolution::Resolved {
            method: details.clone(),
            source: MethodSource::RequestDetails,
        };
    }

    request
        .beneficiary_id
        .and_then(|id| directory.get_default_payment_method(id))
        .map_or(Resolution::Unresolved, |method| Resolution::Resolved {
            method,
            source: MethodSource::DirectoryDefault,
        })
}

/// Resolve the destination or fail with `UnresolvedPaymentMethod`
pub fn require<D>(request: &PayoutRequest, directory: &D) -> Result<PaymentMethodSnapshot, PayoutError>
where
    D: BeneficiaryDirectory + ?Sized,
{
    match resolve(request, directory) {
        Resolution::Resolved { method, .. } => Ok(method),
        Resolution::Unresolved => Err(PayoutError::unresolved_payment_method(request.id)),
    }
}
