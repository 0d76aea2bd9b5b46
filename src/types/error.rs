//! Error types for the Payout Engine
//!
//! This module defines all error types that can occur while listing,
//! transitioning, exporting and reconciling payout requests.
//!
//! # Error Categories
//!
//! - **File I/O Errors**: File not found, permission denied, etc.
//! - **CSV Parsing Errors**: Malformed ledger, directory or report rows
//! - **Workflow Errors**: Unknown request, illegal status edge, missing unit
//! - **Reconciliation Errors**: Unresolvable destination, unmatched or unreadable report

use super::payout::{BeneficiaryId, PayoutStatus, RequestId};
use thiserror::Error;

/// Main error type for the payout engine
///
/// Single-item operations surface these directly. Bulk and import operations
/// collect them per item alongside their successes instead of aborting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayoutError {
    /// File not found at the specified path
    ///
    /// This is a fatal error that prevents processing from starting.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// No payout request with this id exists in the ledger
    #[error("Payout request {id} not found")]
    NotFound {
        /// The unknown request id
        id: RequestId,
    },

    /// The requested status edge is not part of the transition graph
    ///
    /// Always returned for attempts to leave a terminal status.
    #[error("Invalid transition for payout request {id}: {from} -> {to}")]
    InvalidTransition {
        /// Request id
        id: RequestId,
        /// Status read at call time
        from: PayoutStatus,
        /// Requested target status
        to: PayoutStatus,
    },

    /// Neither the request nor the beneficiary directory carries a destination
    #[error("No payment method resolved for payout request {id}")]
    UnresolvedPaymentMethod {
        /// Request id
        id: RequestId,
    },

    /// A completion report row references an id the ledger does not know
    #[error("Report row at line {line} references unknown payout request {request_id}")]
    ImportRowMismatch {
        /// Report line number (header is line 1)
        line: u64,
        /// Id as written in the report
        request_id: String,
    },

    /// The completion report cannot be read as a report at all
    #[error("Malformed import file: {message}")]
    MalformedImportFile {
        /// What made the file unreadable
        message: String,
    },

    /// The beneficiary has no pending aggregated unit
    #[error("No pending payout unit for beneficiary {beneficiary}")]
    UnitNotFound {
        /// Beneficiary id
        beneficiary: BeneficiaryId,
    },
}

// Conversion from io::Error to PayoutError
impl From<std::io::Error> for PayoutError {
    fn from(error: std::io::Error) -> Self {
        PayoutError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to PayoutError
impl From<csv::Error> for PayoutError {
    fn from(error: csv::Error) -> Self {
        // Extract line number if available
        let line = error.position().map(|pos| pos.line());

        PayoutError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl PayoutError {
    /// Create a NotFound error
    pub fn not_found(id: RequestId) -> Self {
        PayoutError::NotFound { id }
    }

    /// Create an InvalidTransition error
    pub fn invalid_transition(id: RequestId, from: PayoutStatus, to: PayoutStatus) -> Self {
        PayoutError::InvalidTransition { id, from, to }
    }

    /// Create an UnresolvedPaymentMethod error
    pub fn unresolved_payment_method(id: RequestId) -> Self {
        PayoutError::UnresolvedPaymentMethod { id }
    }

    /// Create an ImportRowMismatch error
    pub fn import_row_mismatch(line: u64, request_id: &str) -> Self {
        PayoutError::ImportRowMismatch {
            line,
            request_id: request_id.to_string(),
        }
    }

    /// Create a MalformedImportFile error
    pub fn malformed_import_file(message: &str) -> Self {
        PayoutError::MalformedImportFile {
            message: message.to_string(),
        }
    }

    /// Create a ParseError error
    pub fn parse_error(line: Option<u64>, message: &str) -> Self {
        PayoutError::ParseError {
            line,
            message: message.to_string(),
        }
    }
}
