//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, output serialization)
//! - `snapshot` - Loading and saving the ledger snapshot and beneficiary directory
//! - `sync_reader` - Synchronous completion-report reader with iterator interface
//! - `async_reader` - Asynchronous completion-report reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod snapshot;
pub mod sync_reader;

pub use async_reader::AsyncReportReader;
pub use csv_format::{
    write_bulk_result_csv, write_export_csv, write_import_summary_csv, write_ledger_csv,
    write_requests_csv, write_stats_csv, write_units_csv,
};
pub use snapshot::{load_directory, load_ledger, save_ledger};
pub use sync_reader::ReportReader;
