//! Ledger snapshot and beneficiary directory files
//!
//! The ledger and the directory are loaded whole: they are the source of
//! truth for every command, so a malformed row is a fatal error (with its
//! line number) rather than a skipped record.
//!
//! Saving writes a temporary file next to the ledger and renames it over the
//! original, so a failed save leaves the previous snapshot intact.

use crate::io::csv_format::{
    convert_directory_record, convert_ledger_record, write_ledger_csv, DirectoryCsvRecord,
    LedgerCsvRecord,
};
use crate::types::{Beneficiary, PayoutError, PayoutRequest};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Open a file, mapping a missing path to `FileNotFound`
pub fn open_file(path: &Path) -> Result<File, PayoutError> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PayoutError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => PayoutError::IoError {
            message: format!("Failed to open file '{}': {}", path.display(), e),
        },
    })
}

/// Deserialize and convert every row, failing on the first bad one
///
/// Each item is paired with the physical line its record starts on.
fn read_all<R, T, U, F>(reader: R, convert: F) -> Result<Vec<(u64, U)>, PayoutError>
where
    R: Read,
    T: DeserializeOwned,
    F: Fn(T) -> Result<U, String>,
{
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();
    let mut record = StringRecord::new();
    let mut items = Vec::new();

    while reader.read_record(&mut record)? {
        let line = record
            .position()
            .map_or(items.len() as u64 + 2, |pos| pos.line());
        let row: T = record.deserialize(Some(&headers))?;
        let item = convert(row).map_err(|e| PayoutError::parse_error(Some(line), &e))?;
        items.push((line, item));
    }

    Ok(items)
}

/// Read a ledger snapshot from any reader
///
/// # Errors
///
/// `ParseError` for a malformed row or a duplicated request id.
pub fn read_ledger<R: Read>(reader: R) -> Result<Vec<PayoutRequest>, PayoutError> {
    let rows = read_all::<_, LedgerCsvRecord, _, _>(reader, convert_ledger_record)?;

    let mut seen = HashSet::with_capacity(rows.len());
    for (line, request) in &rows {
        if !seen.insert(request.id) {
            return Err(PayoutError::parse_error(
                Some(*line),
                &format!("duplicate payout request id {}", request.id),
            ));
        }
    }

    Ok(rows.into_iter().map(|(_, request)| request).collect())
}

/// Load the ledger snapshot at `path`
pub fn load_ledger(path: &Path) -> Result<Vec<PayoutRequest>, PayoutError> {
    let requests = read_ledger(open_file(path)?)?;
    tracing::debug!(path = %path.display(), records = requests.len(), "ledger loaded");
    Ok(requests)
}

/// Write the ledger snapshot back to `path`
///
/// The snapshot is written to a temporary file in the same directory and then
/// renamed over `path`.
pub fn save_ledger(path: &Path, requests: &[PayoutRequest]) -> Result<(), PayoutError> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(dir).map_err(|e| PayoutError::IoError {
        message: format!("Failed to create temporary file in '{}': {}", dir.display(), e),
    })?;

    {
        let mut writer = BufWriter::new(&mut staged);
        write_ledger_csv(requests, &mut writer)?;
        writer.flush()?;
    }
    staged.as_file().sync_all()?;

    staged.persist(path).map_err(|e| PayoutError::IoError {
        message: format!("Failed to replace '{}': {}", path.display(), e.error),
    })?;
    tracing::debug!(path = %path.display(), records = requests.len(), "ledger saved");
    Ok(())
}

/// Read a beneficiary directory from any reader
pub fn read_directory<R: Read>(reader: R) -> Result<Vec<Beneficiary>, PayoutError> {
    let rows = read_all::<_, DirectoryCsvRecord, _, _>(reader, convert_directory_record)?;
    Ok(rows.into_iter().map(|(_, beneficiary)| beneficiary).collect())
}

/// Load the beneficiary directory at `path`
pub fn load_directory(path: &Path) -> Result<Vec<Beneficiary>, PayoutError> {
    let beneficiaries = read_directory(open_file(path)?)?;
    tracing::debug!(path = %path.display(), entries = beneficiaries.len(), "directory loaded");
    Ok(beneficiaries)
}
