//! CSV format handling for ledger snapshots, directories, exports and reports
//!
//! This module centralizes all CSV format concerns, providing:
//! - Record structures for the ledger snapshot, beneficiary directory and
//!   completion report
//! - Conversion from CSV records to domain types
//! - Output serialization for listings, export sheets, bulk results and stats
//!
//! All functions are pure (no file I/O) for easy testing. Money is written
//! with two decimal places; timestamps are RFC 3339.

use crate::core::bulk::BulkResult;
use crate::core::engine::{AnnotatedRequest, AnnotatedUnit};
use crate::core::reconciliation::{
    ExportBatch, ExportRow, ImportSummary, ReportRow, ReportedOutcome,
};
use crate::core::resolver::{MethodSource, Resolution};
use crate::core::stats::StatsSummary;
use crate::types::{
    BankDestination, Beneficiary, BeneficiaryId, MobileMoneyDestination, PayPalDestination,
    PaymentMethodKind, PaymentMethodSnapshot, PayoutError, PayoutRequest, PayoutStatus, Period,
    RequestId,
};
use chrono::{DateTime, SecondsFormat, Utc};
use csv::Writer;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

/// Columns every completion report must carry
pub const REPORT_REQUIRED_COLUMNS: [&str; 2] = ["request_id", "status"];

/// Ledger snapshot row
///
/// The method columns are empty when the request carries no payout details.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerCsvRecord {
    pub id: RequestId,
    pub beneficiary_id: Option<BeneficiaryId>,
    /// Recomputed from solo + collab when empty
    pub total_amount: Option<String>,
    pub solo_amount: String,
    pub collab_amount: String,
    pub status: String,
    pub month: u32,
    pub year: i32,
    pub created_at: String,
    /// Defaults to `created_at` when empty
    pub updated_at: Option<String>,
    pub method: Option<String>,
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_code: Option<String>,
    pub paypal_email: Option<String>,
    pub phone: Option<String>,
    pub provider: Option<String>,
}

/// Beneficiary directory row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DirectoryCsvRecord {
    pub beneficiary_id: BeneficiaryId,
    pub name: String,
    pub email: String,
    pub method: Option<String>,
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_code: Option<String>,
    pub paypal_email: Option<String>,
    pub phone: Option<String>,
    pub provider: Option<String>,
}

/// Completion report row
///
/// Only the id and the reported outcome are read; every other export column
/// is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportCsvRecord {
    pub request_id: String,
    pub status: String,
}

/// The flat method columns shared by ledger and directory rows
#[derive(Debug, Clone, Default, PartialEq)]
struct MethodColumns {
    method: Option<String>,
    account_name: Option<String>,
    account_number: Option<String>,
    bank_name: Option<String>,
    bank_code: Option<String>,
    paypal_email: Option<String>,
    phone: Option<String>,
    provider: Option<String>,
}

impl MethodColumns {
    fn from_snapshot(snapshot: Option<&PaymentMethodSnapshot>) -> Self {
        let Some(snapshot) = snapshot else {
            return MethodColumns::default();
        };
        let mut columns = MethodColumns {
            method: Some(snapshot.kind().as_str().to_string()),
            ..MethodColumns::default()
        };
        match snapshot {
            PaymentMethodSnapshot::Bank(bank) => {
                columns.account_name = Some(bank.account_name.clone());
                columns.account_number = Some(bank.account_number.clone());
                columns.bank_name = Some(bank.bank_name.clone());
                columns.bank_code = bank.bank_code.clone();
            }
            PaymentMethodSnapshot::PayPal(paypal) => {
                columns.paypal_email = Some(paypal.email.clone());
            }
            PaymentMethodSnapshot::MobileMoney(mobile) => {
                columns.phone = Some(mobile.phone.clone());
                columns.provider = Some(mobile.provider.clone());
            }
        }
        columns
    }

    /// Build the snapshot the columns describe, `None` when `method` is empty
    fn into_snapshot(self) -> Result<Option<PaymentMethodSnapshot>, String> {
        let Some(method) = non_empty(self.method) else {
            return Ok(None);
        };
        let kind = PaymentMethodKind::parse(&method)
            .ok_or_else(|| format!("Invalid payment method '{}'", method))?;

        let snapshot = match kind {
            PaymentMethodKind::Bank => PaymentMethodSnapshot::Bank(BankDestination {
                account_name: required(self.account_name, kind, "account_name")?,
                account_number: required(self.account_number, kind, "account_number")?,
                bank_name: required(self.bank_name, kind, "bank_name")?,
                bank_code: non_empty(self.bank_code),
            }),
            PaymentMethodKind::PayPal => PaymentMethodSnapshot::PayPal(PayPalDestination {
                email: required(self.paypal_email, kind, "paypal_email")?,
            }),
            PaymentMethodKind::MobileMoney => {
                PaymentMethodSnapshot::MobileMoney(MobileMoneyDestination {
                    phone: required(self.phone, kind, "phone")?,
                    provider: required(self.provider, kind, "provider")?,
                })
            }
        };
        Ok(Some(snapshot))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, kind: PaymentMethodKind, column: &str) -> Result<String, String> {
    non_empty(value).ok_or_else(|| format!("{} payment method requires '{}'", kind, column))
}

fn parse_amount(value: &str, column: &str) -> Result<Decimal, String> {
    Decimal::from_str(value.trim()).map_err(|_| format!("Invalid {} '{}'", column, value))
}

fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| format!("Invalid {} '{}'", column, value))
}

/// Two-decimal rendering for listings and stats
fn format_money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

/// Amount exactly as stored, for ledger snapshots and export sheets
fn exact_money(amount: Decimal) -> String {
    amount.to_string()
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Convert a LedgerCsvRecord to a PayoutRequest
///
/// # Arguments
///
/// * `record` - The deserialized ledger row
///
/// # Returns
///
/// Result containing either:
/// - Ok(PayoutRequest) - Successfully converted record
/// - Err(String) - Error message describing the conversion failure
pub fn convert_ledger_record(record: LedgerCsvRecord) -> Result<PayoutRequest, String> {
    let status = PayoutStatus::from_str(&record.status)
        .map_err(|_| format!("Invalid status '{}' for request {}", record.status, record.id))?;
    if !(1..=12).contains(&record.month) {
        return Err(format!(
            "Invalid month {} for request {}",
            record.month, record.id
        ));
    }

    let solo_amount = parse_amount(&record.solo_amount, "solo_amount")?;
    let collab_amount = parse_amount(&record.collab_amount, "collab_amount")?;
    let created_at = parse_timestamp(&record.created_at, "created_at")?;

    let mut request = PayoutRequest::new(
        record.id,
        record.beneficiary_id,
        solo_amount,
        collab_amount,
        Period::new(record.month, record.year),
        created_at,
    )
    .with_status(status);

    if let Some(total) = non_empty(record.total_amount) {
        request.total_amount = parse_amount(&total, "total_amount")?;
    }
    if let Some(updated) = non_empty(record.updated_at) {
        request.updated_at = parse_timestamp(&updated, "updated_at")?;
    }

    request.payout_details = MethodColumns {
        method: record.method,
        account_name: record.account_name,
        account_number: record.account_number,
        bank_name: record.bank_name,
        bank_code: record.bank_code,
        paypal_email: record.paypal_email,
        phone: record.phone,
        provider: record.provider,
    }
    .into_snapshot()
    .map_err(|e| format!("{} for request {}", e, record.id))?;

    Ok(request)
}

/// Convert a PayoutRequest back to its ledger row
pub fn ledger_record(request: &PayoutRequest) -> LedgerCsvRecord {
    let columns = MethodColumns::from_snapshot(request.payout_details.as_ref());
    LedgerCsvRecord {
        id: request.id,
        beneficiary_id: request.beneficiary_id,
        total_amount: Some(exact_money(request.total_amount)),
        solo_amount: exact_money(request.solo_amount),
        collab_amount: exact_money(request.collab_amount),
        status: request.status.to_string(),
        month: request.period.month,
        year: request.period.year,
        created_at: format_timestamp(request.created_at),
        updated_at: Some(format_timestamp(request.updated_at)),
        method: columns.method,
        account_name: columns.account_name,
        account_number: columns.account_number,
        bank_name: columns.bank_name,
        bank_code: columns.bank_code,
        paypal_email: columns.paypal_email,
        phone: columns.phone,
        provider: columns.provider,
    }
}

/// Convert a DirectoryCsvRecord to a Beneficiary
pub fn convert_directory_record(record: DirectoryCsvRecord) -> Result<Beneficiary, String> {
    let default_method = MethodColumns {
        method: record.method,
        account_name: record.account_name,
        account_number: record.account_number,
        bank_name: record.bank_name,
        bank_code: record.bank_code,
        paypal_email: record.paypal_email,
        phone: record.phone,
        provider: record.provider,
    }
    .into_snapshot()
    .map_err(|e| format!("{} for beneficiary {}", e, record.beneficiary_id))?;

    Ok(Beneficiary {
        id: record.beneficiary_id,
        name: record.name,
        email: record.email,
        default_method,
    })
}

/// Convert a ReportCsvRecord to a ReportRow
///
/// # Errors
///
/// - `ImportRowMismatch` if the id is not a valid request id
/// - `ParseError` if the reported outcome is unknown
pub fn convert_report_record(line: u64, record: ReportCsvRecord) -> Result<ReportRow, PayoutError> {
    let request_id = record
        .request_id
        .trim()
        .parse::<RequestId>()
        .map_err(|_| PayoutError::import_row_mismatch(line, record.request_id.trim()))?;

    let outcome = ReportedOutcome::parse(&record.status).ok_or_else(|| {
        PayoutError::parse_error(
            Some(line),
            &format!("unknown reported outcome '{}'", record.status.trim()),
        )
    })?;

    Ok(ReportRow {
        line,
        request_id,
        outcome,
    })
}

/// Names of required report columns missing from a header row
pub fn missing_report_columns<'a, I>(headers: I) -> Vec<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<String> = headers
        .into_iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    REPORT_REQUIRED_COLUMNS
        .into_iter()
        .filter(|column| !present.iter().any(|h| h == column))
        .collect()
}

/// Write a ledger snapshot
///
/// # Arguments
///
/// * `requests` - Records in ledger order
/// * `output` - Mutable reference to a writer for outputting CSV
pub fn write_ledger_csv(requests: &[PayoutRequest], output: &mut dyn Write) -> Result<(), PayoutError> {
    let mut writer = Writer::from_writer(output);
    for request in requests {
        writer.serialize(ledger_record(request))?;
    }
    writer.flush()?;
    Ok(())
}

fn resolution_columns(resolution: &Resolution) -> [String; 2] {
    match resolution {
        Resolution::Resolved { method, source } => [
            method.kind().to_string(),
            match source {
                MethodSource::RequestDetails => "request".to_string(),
                MethodSource::DirectoryDefault => "directory".to_string(),
            },
        ],
        Resolution::Unresolved => ["unresolved".to_string(), String::new()],
    }
}

/// Write a request-level stage listing
pub fn write_requests_csv(
    requests: &[AnnotatedRequest],
    output: &mut dyn Write,
) -> Result<(), PayoutError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record([
        "id",
        "beneficiary_id",
        "status",
        "period",
        "total_amount",
        "solo_amount",
        "collab_amount",
        "payment_method",
        "method_source",
    ])?;

    for annotated in requests {
        let request = &annotated.request;
        let [method, source] = resolution_columns(&annotated.payment_method);
        writer.write_record(&[
            request.id.to_string(),
            request
                .beneficiary_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            request.status.to_string(),
            request.period.to_string(),
            format_money(request.total_amount),
            format_money(request.solo_amount),
            format_money(request.collab_amount),
            method,
            source,
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a review-stage unit listing
///
/// Periods and member ids are `;`-separated.
pub fn write_units_csv(units: &[AnnotatedUnit], output: &mut dyn Write) -> Result<(), PayoutError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record([
        "beneficiary_id",
        "total_amount",
        "solo_amount",
        "collab_amount",
        "periods",
        "member_count",
        "member_request_ids",
        "payment_method",
        "method_source",
    ])?;

    for annotated in units {
        let unit = &annotated.unit;
        let [method, source] = resolution_columns(&annotated.payment_method);
        writer.write_record(&[
            unit.beneficiary_id.to_string(),
            format_money(unit.total_amount),
            format_money(unit.solo_amount),
            format_money(unit.collab_amount),
            join(&unit.periods),
            unit.member_count().to_string(),
            join(&unit.member_request_ids),
            method,
            source,
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

/// Fixed header of one export sheet
pub fn export_header(kind: PaymentMethodKind) -> &'static [&'static str] {
    match kind {
        PaymentMethodKind::Bank => &[
            "request_id",
            "beneficiary_id",
            "name",
            "email",
            "account_name",
            "account_number",
            "bank_name",
            "bank_code",
            "total_amount",
            "solo_amount",
            "collab_amount",
        ],
        PaymentMethodKind::PayPal => &[
            "request_id",
            "beneficiary_id",
            "name",
            "email",
            "paypal_email",
            "total_amount",
            "solo_amount",
            "collab_amount",
        ],
        PaymentMethodKind::MobileMoney => &[
            "request_id",
            "beneficiary_id",
            "name",
            "email",
            "phone",
            "provider",
            "total_amount",
            "solo_amount",
            "collab_amount",
        ],
    }
}

fn export_record(row: &ExportRow) -> Vec<String> {
    let mut record = vec![
        row.request_id.to_string(),
        row.beneficiary_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        row.name.clone(),
        row.email.clone(),
    ];
    match &row.method {
        PaymentMethodSnapshot::Bank(bank) => record.extend([
            bank.account_name.clone(),
            bank.account_number.clone(),
            bank.bank_name.clone(),
            bank.bank_code.clone().unwrap_or_default(),
        ]),
        PaymentMethodSnapshot::PayPal(paypal) => record.push(paypal.email.clone()),
        PaymentMethodSnapshot::MobileMoney(mobile) => {
            record.extend([mobile.phone.clone(), mobile.provider.clone()])
        }
    }
    record.extend([
        exact_money(row.total_amount),
        exact_money(row.solo_amount),
        exact_money(row.collab_amount),
    ]);
    record
}

/// Write one export sheet
///
/// Only the batch rows whose destination is of `kind` are written. The header
/// is always written, so an empty sheet still matches the template.
pub fn write_export_csv(
    kind: PaymentMethodKind,
    batch: &ExportBatch,
    output: &mut dyn Write,
) -> Result<(), PayoutError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record(export_header(kind))?;
    for row in batch.rows_for(kind) {
        writer.write_record(export_record(row))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a bulk result: one line per id, successes first
pub fn write_bulk_result_csv(result: &BulkResult, output: &mut dyn Write) -> Result<(), PayoutError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record(["id", "outcome", "reason"])?;
    for id in &result.succeeded {
        writer.write_record([id.to_string().as_str(), "ok", ""])?;
    }
    for failure in &result.failed {
        writer.write_record(&[
            failure.id.to_string(),
            "failed".to_string(),
            failure.reason.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write an import summary: the applied count, then one line per warning
pub fn write_import_summary_csv(
    summary: &ImportSummary,
    output: &mut dyn Write,
) -> Result<(), PayoutError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record(["outcome", "detail"])?;
    writer.write_record(["applied", summary.applied.to_string().as_str()])?;
    for warning in summary.warning_messages() {
        writer.write_record(["warning", warning.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a stats summary as `metric,value` pairs
pub fn write_stats_csv(summary: &StatsSummary, output: &mut dyn Write) -> Result<(), PayoutError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record(["metric", "value"])?;
    writer.write_record(["count", summary.count.to_string().as_str()])?;
    for status in PayoutStatus::ALL {
        writer.write_record(&[
            format!("count_{}", status),
            summary.count_for(status).to_string(),
        ])?;
    }
    writer.write_record(["total_amount", format_money(summary.total_amount).as_str()])?;
    writer.write_record(["solo_amount", format_money(summary.solo_amount).as_str()])?;
    writer.write_record(["collab_amount", format_money(summary.collab_amount).as_str()])?;
    writer.write_record(["average_amount", format_money(summary.average_amount).as_str()])?;
    writer.flush()?;
    Ok(())
}
