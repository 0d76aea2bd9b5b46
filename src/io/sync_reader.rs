//! Synchronous completion-report reader with iterator interface
//!
//! Provides a streaming iterator over completion-report rows from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Design
//!
//! The ReportReader validates the header row once, up front: a report without
//! both a `request_id` and a `status` column is not a report at all and is
//! rejected with `MalformedImportFile`. After that every row is yielded,
//! good or bad, so the caller can apply what it can and warn about the rest.
//!
//! ```no_run
//! use payout_engine::io::sync_reader::ReportReader;
//! use std::path::Path;
//!
//! let reader = ReportReader::open(Path::new("report.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(row) => println!("request {} reported {:?}", row.request_id, row.outcome),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, missing columns) are returned from the
//!   constructors
//! - Individual row errors are yielded as Err variants in the iterator
//! - Line numbers are included in every row error (the header is line 1)

use crate::core::reconciliation::ReportRow;
use crate::io::csv_format::{convert_report_record, missing_report_columns, ReportCsvRecord};
use crate::io::snapshot::open_file;
use crate::types::PayoutError;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Synchronous completion-report reader
///
/// Maintains streaming behavior with constant memory usage.
#[derive(Debug)]
pub struct ReportReader<R: Read = File> {
    reader: csv::Reader<R>,
    /// Header row, trimmed and lower-cased
    headers: StringRecord,
    record: StringRecord,
    line_num: u64,
}

impl ReportReader<File> {
    /// Open a completion report from a file path
    ///
    /// # Errors
    ///
    /// * `FileNotFound` if the path does not exist
    /// * `MalformedImportFile` if a required column is missing
    pub fn open(path: &Path) -> Result<Self, PayoutError> {
        ReportReader::from_reader(open_file(path)?)
    }
}

impl<R: Read> ReportReader<R> {
    /// Create a ReportReader over any reader and validate its header row
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (reports are hand-edited spreadsheets)
    pub fn from_reader(reader: R) -> Result<Self, PayoutError> {
        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(reader);

        let headers: StringRecord = reader
            .headers()
            .map_err(|e| PayoutError::malformed_import_file(&e.to_string()))?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let missing = missing_report_columns(headers.iter());
        if !missing.is_empty() {
            return Err(PayoutError::malformed_import_file(&format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
            line_num: 1,
        })
    }
}

impl<R: Read> Iterator for ReportReader<R> {
    type Item = Result<ReportRow, PayoutError>;

    /// Get the next report row
    ///
    /// # Returns
    ///
    /// * `Some(Ok(ReportRow))` - Successfully parsed row
    /// * `Some(Err(PayoutError))` - Parse error or unusable id, with line number
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                // Physical line: blank lines and multi-line fields count
                self.line_num = self
                    .record
                    .position()
                    .map_or(self.line_num + 1, |pos| pos.line());
                let line = self.line_num;
                Some(
                    self.record
                        .deserialize::<ReportCsvRecord>(Some(&self.headers))
                        .map_err(|e| PayoutError::parse_error(Some(line), &e.to_string()))
                        .and_then(|record| convert_report_record(line, record)),
                )
            }
            Ok(false) => None,
            Err(e) => {
                self.line_num = e.position().map_or(self.line_num + 1, |pos| pos.line());
                Some(Err(PayoutError::parse_error(
                    Some(self.line_num),
                    &e.to_string(),
                )))
            }
        }
    }
}
