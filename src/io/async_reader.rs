//! Asynchronous completion-report reader with batch interface
//!
//! Provides batch reading over completion-report rows for the async
//! execution strategy.
//!
//! # Design
//!
//! The AsyncReportReader uses:
//! - csv-async for streaming CSV parsing
//! - tokio (through a compat layer) for file access
//! - Batch reading so each batch can be fanned out across tasks
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReportReader → Batches of Result<ReportRow, PayoutError>
//!                  ↓
//!           csv_format module
//!           (ReportCsvRecord, convert_report_record)
//! ```
//!
//! Header validation and line numbering match the synchronous
//! [`ReportReader`](crate::io::sync_reader::ReportReader), so both strategies
//! report the same warnings.

use crate::core::reconciliation::ReportRow;
use crate::io::csv_format::{convert_report_record, missing_report_columns, ReportCsvRecord};
use crate::types::PayoutError;
use csv_async::{AsyncReaderBuilder, StringRecord, Trim};
use futures::io::AsyncRead;

/// Asynchronous completion-report reader
///
/// Maintains streaming behavior with constant memory usage per batch.
pub struct AsyncReportReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncReader<R>,
    /// Header row, trimmed and lower-cased
    headers: StringRecord,
    line_num: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReportReader<R> {
    /// Create a new AsyncReportReader and validate its header row
    ///
    /// # Arguments
    ///
    /// * `reader` - Async reader providing CSV data
    ///
    /// # Returns
    ///
    /// * `Ok(AsyncReportReader)` if the header carries every required column
    /// * `Err(PayoutError::MalformedImportFile)` otherwise
    pub async fn new(reader: R) -> Result<Self, PayoutError> {
        let mut csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .create_reader(reader);

        let headers: StringRecord = csv_reader
            .headers()
            .await
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
            csv_reader,
            headers,
            line_num: 1,
        })
    }

    /// Read a batch of report rows
    ///
    /// Reads up to `batch_size` rows. Rows that fail to parse are returned as
    /// `Err` in their position so they surface as import warnings.
    ///
    /// # Returns
    ///
    /// A vector of parsed rows. Returns an empty vector when the end of the
    /// file is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Result<ReportRow, PayoutError>> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut record = StringRecord::new();

        while batch.len() < batch_size {
            match self.csv_reader.read_record(&mut record).await {
                Ok(true) => {
                    self.line_num = record
                        .position()
                        .map_or(self.line_num + 1, |pos| pos.line());
                    let line = self.line_num;
                    batch.push(
                        record
                            .deserialize::<ReportCsvRecord>(Some(&self.headers))
                            .map_err(|e| PayoutError::parse_error(Some(line), &e.to_string()))
                            .and_then(|csv_record| convert_report_record(line, csv_record)),
                    )
                }
                Ok(false) => break,
                Err(e) => {
                    self.line_num += 1;
                    batch.push(Err(PayoutError::parse_error(
                        Some(self.line_num),
                        &e.to_string(),
                    )))
                }
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reconciliation::ReportedOutcome;
    use futures::io::Cursor;

    #[tokio::test]
    async fn test_async_reader_read_batch() {
        let csv_content = "request_id,status\n1,paid\n2,failed\n3,paid\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReportReader::new(reader).await.unwrap();

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].as_ref().unwrap().request_id, 1);
        assert_eq!(batch[1].as_ref().unwrap().outcome, ReportedOutcome::Failed);

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].as_ref().unwrap().line, 4);

        assert!(async_reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_rejects_missing_columns() {
        let reader = Cursor::new("id,outcome\n1,paid\n".as_bytes());
        let result = AsyncReportReader::new(reader).await;

        assert_eq!(
            result.err(),
            Some(PayoutError::malformed_import_file(
                "missing required column(s): request_id, status"
            ))
        );
    }

    #[tokio::test]
    async fn test_async_reader_keeps_bad_rows_in_place() {
        let csv_content = "name, Request_Id ,STATUS\nAda,1,paid\nBo,x,paid\nCy,3,lost\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReportReader::new(reader).await.unwrap();

        let batch = async_reader.read_batch(10).await;

        assert_eq!(batch.len(), 3);
        assert!(batch[0].is_ok());
        assert_eq!(
            batch[1].as_ref().unwrap_err(),
            &PayoutError::import_row_mismatch(3, "x")
        );
        assert!(matches!(
            batch[2].as_ref().unwrap_err(),
            PayoutError::ParseError { line: Some(4), .. }
        ));
    }

    #[tokio::test]
    async fn test_async_reader_lines_follow_the_file() {
        let csv_content = "request_id,status,note\n1,paid,\"two\nlines\"\n\n77,paid,x\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReportReader::new(reader).await.unwrap();

        let batch = async_reader.read_batch(10).await;

        let lines: Vec<u64> = batch.iter().map(|row| row.as_ref().unwrap().line).collect();
        assert_eq!(lines, vec![2, 5]);
    }

    #[tokio::test]
    async fn test_async_reader_empty_report() {
        let reader = Cursor::new("request_id,status\n".as_bytes());
        let mut async_reader = AsyncReportReader::new(reader).await.unwrap();

        assert!(async_reader.read_batch(10).await.is_empty());
    }
}
