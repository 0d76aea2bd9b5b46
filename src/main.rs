//! Payout Engine CLI
//!
//! Command-line interface for reviewing, approving, exporting and reconciling
//! beneficiary payouts held in a CSV ledger snapshot.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --ledger ledger.csv --directory directory.csv list review > units.csv
//! cargo run -- --ledger ledger.csv approve-unit 42
//! cargo run -- --ledger ledger.csv bulk rejected 7 8 9
//! cargo run -- --ledger ledger.csv --directory directory.csv export --out-dir sheets/
//! cargo run -- --ledger ledger.csv --strategy async import report.csv
//! cargo run -- --ledger ledger.csv stats history --year 2024
//! ```
//!
//! Command results are written to stdout as CSV. Logs go to stderr; set
//! `RUST_LOG` (e.g. `RUST_LOG=debug`) to change the level.
//!
//! # Exit Codes
//!
//! - 0: Success (bulk and import commands succeed even when single items fail)
//! - 1: Error (file not found, unknown request, invalid transition, etc.)

use payout_engine::cli;
use std::process;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let mut output = std::io::stdout().lock();
    if let Err(e) = cli::run(&args, &mut output) {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
