//! Command dispatch
//!
//! Loads the ledger snapshot (and directory, when given), runs one operator
//! command, writes its CSV result to the output, and saves the ledger back
//! when the command changed it. A failing command leaves the ledger file
//! untouched.

use super::args::{CliArgs, Command, StrategyType};
use crate::core::directory::InMemoryDirectory;
use crate::core::engine::{PayoutEngine, StageListing};
use crate::core::ledger::InMemoryLedger;
use crate::core::stage::Stage;
use crate::io::csv_format::{
    write_bulk_result_csv, write_export_csv, write_import_summary_csv, write_requests_csv,
    write_stats_csv, write_units_csv,
};
use crate::io::snapshot::{load_directory, load_ledger, save_ledger};
use crate::strategy::{create_strategy, BatchConfig};
use crate::types::{PaymentMethodKind, PayoutError, PeriodFilter};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

type Engine = PayoutEngine<InMemoryLedger, InMemoryDirectory>;

/// Run the parsed command
///
/// # Arguments
///
/// * `args` - Parsed command-line arguments
/// * `output` - Writer receiving the command's CSV result
///
/// # Returns
///
/// * `Ok(())` if the command completed (bulk and import commands complete
///   even when individual items fail)
/// * `Err(PayoutError)` if the command itself failed
pub fn run(args: &CliArgs, output: &mut dyn Write) -> Result<(), PayoutError> {
    let mut ledger = InMemoryLedger::from_requests(load_ledger(&args.ledger)?);

    match &args.command {
        Command::Bulk { status, ids } => {
            let strategy = create_strategy(args.strategy, batch_config(args));
            let result = strategy.bulk_transition(&mut ledger, ids, *status)?;
            write_bulk_result_csv(&result, output)?;
        }
        Command::Import { report } => {
            let strategy = create_strategy(args.strategy, batch_config(args));
            let summary = strategy.import_report(&mut ledger, report)?;
            write_import_summary_csv(&summary, output)?;
        }
        command => {
            let mut engine = PayoutEngine::new(ledger, directory(args)?);
            run_engine_command(&mut engine, command, output)?;
            ledger = engine.into_ledger();
        }
    }

    if args.command.mutates_ledger() {
        save_ledger(&args.ledger, &ledger.into_requests())?;
    }

    Ok(())
}

fn batch_config(args: &CliArgs) -> Option<BatchConfig> {
    matches!(args.strategy, StrategyType::Async).then(|| args.to_batch_config())
}

fn directory(args: &CliArgs) -> Result<InMemoryDirectory, PayoutError> {
    match &args.directory {
        Some(path) => Ok(InMemoryDirectory::from_beneficiaries(load_directory(path)?)),
        None => {
            tracing::debug!("no beneficiary directory given, resolving from request details only");
            Ok(InMemoryDirectory::new())
        }
    }
}

fn run_engine_command(
    engine: &mut Engine,
    command: &Command,
    output: &mut dyn Write,
) -> Result<(), PayoutError> {
    match command {
        Command::List {
            stage,
            period,
            orphaned,
        } => match engine.list_stage(*stage, (*period).into()) {
            StageListing::Units { units, orphaned: orphans } => {
                if *orphaned {
                    write_requests_csv(&orphans, output)
                } else {
                    write_units_csv(&units, output)
                }
            }
            StageListing::Requests(requests) => write_requests_csv(&requests, output),
        },
        Command::Transition { id, status } => {
            let updated = engine.transition(*id, *status)?;
            write_requests_csv(&[engine.annotate(updated)], output)
        }
        Command::Revert { id } => {
            let updated = engine.revert(*id)?;
            write_requests_csv(&[engine.annotate(updated)], output)
        }
        Command::ApproveUnit { beneficiary } => {
            let result = engine.approve_unit(*beneficiary)?;
            write_bulk_result_csv(&result, output)
        }
        Command::Export {
            stage,
            period,
            out_dir,
            no_advance,
        } => export(engine, *stage, (*period).into(), out_dir, !no_advance, output),
        Command::Stats { stage, period } => {
            write_stats_csv(&engine.stats(*stage, (*period).into()), output)
        }
        Command::Bulk { .. } | Command::Import { .. } => Err(PayoutError::IoError {
            message: "batch commands run through an execution strategy".to_string(),
        }),
    }
}

/// Write one sheet per payment method type that has rows
///
/// Outputs a `sheet,rows,path` line per written file.
fn export(
    engine: &mut Engine,
    stage: Stage,
    period: PeriodFilter,
    out_dir: &Path,
    advance: bool,
    output: &mut dyn Write,
) -> Result<(), PayoutError> {
    let run = engine.export_batch(stage, period, advance);
    fs::create_dir_all(out_dir)?;

    let mut summary = csv::Writer::from_writer(output);
    summary.write_record(["sheet", "rows", "path"])?;

    for kind in PaymentMethodKind::ALL {
        let rows = run.batch.rows_for(kind).len();
        if rows == 0 {
            continue;
        }
        let path: PathBuf = out_dir.join(format!("payouts_{}_{}.csv", stage, kind));
        let mut writer = BufWriter::new(File::create(&path)?);
        write_export_csv(kind, &run.batch, &mut writer)?;
        writer.flush()?;

        summary.write_record(&[
            kind.to_string(),
            rows.to_string(),
            path.display().to_string(),
        ])?;
    }
    summary.flush()?;

    if !run.batch.unresolved.is_empty() {
        tracing::warn!(
            ids = ?run.batch.unresolved,
            "requests without a payment method were left out of the export"
        );
    }
    if advance && stage == Stage::Approved {
        tracing::info!(
            advanced = run.advanced.succeeded.len(),
            flagged = run.flagged.succeeded.len(),
            "exported requests moved to processing"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    const LEDGER: &str = "\
id,beneficiary_id,total_amount,solo_amount,collab_amount,status,month,year,created_at,updated_at,method,account_name,account_number,bank_name,bank_code,paypal_email,phone,provider
1,10,30.00,30.00,0.00,pending,1,2024,2024-02-01T00:00:00Z,,,,,,,,,
2,10,20.00,15.00,5.00,pending,2,2024,2024-03-01T00:00:00Z,,,,,,,,,
3,11,12.00,12.00,0.00,approved,2,2024,2024-03-01T00:00:00Z,,,,,,,,,
4,,9.00,9.00,0.00,processing,2,2024,2024-03-01T00:00:00Z,,,,,,,,,
";

    const DIRECTORY: &str = "\
beneficiary_id,name,email,method,account_name,account_number,bank_name,bank_code,paypal_email,phone,provider
10,Ada,ada@example.com,paypal,,,,,ada@paypal.test,,
11,Bo,bo@example.com,mobile_money,,,,,,+233200000000,mtn
";

    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            for (name, content) in [("ledger.csv", LEDGER), ("directory.csv", DIRECTORY)] {
                let mut file = File::create(dir.path().join(name)).unwrap();
                file.write_all(content.as_bytes()).unwrap();
            }
            Workspace { dir }
        }

        fn path(&self, name: &str) -> String {
            self.dir.path().join(name).display().to_string()
        }

        fn run(&self, command: &[&str]) -> Result<String, PayoutError> {
            let ledger = self.path("ledger.csv");
            let directory = self.path("directory.csv");
            let mut argv = vec![
                "program",
                "--ledger",
                ledger.as_str(),
                "--directory",
                directory.as_str(),
            ];
            argv.extend_from_slice(command);

            let args = CliArgs::try_parse_from(argv).unwrap();
            let mut output = Vec::<u8>::new();
            run(&args, &mut output)?;
            Ok(String::from_utf8(output).unwrap())
        }
    }

    #[test]
    fn test_list_review_aggregates_units() {
        let ws = Workspace::new();

        let output = ws.run(&["list", "review"]).unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "10,50.00,45.00,5.00,2024-01;2024-02,2,1;2,paypal,directory");
    }

    #[test]
    fn test_transition_persists_ledger() {
        let ws = Workspace::new();

        ws.run(&["transition", "3", "processing"]).unwrap();
        let output = ws.run(&["list", "processing"]).unwrap();

        assert!(output.lines().any(|line| line.starts_with("3,11,processing")));
    }

    #[test]
    fn test_failed_transition_leaves_ledger_untouched() {
        let ws = Workspace::new();
        let before = fs::read_to_string(ws.path("ledger.csv")).unwrap();

        let error = ws.run(&["transition", "1", "paid"]).unwrap_err();

        assert!(matches!(error, PayoutError::InvalidTransition { .. }));
        assert_eq!(fs::read_to_string(ws.path("ledger.csv")).unwrap(), before);
    }

    #[test]
    fn test_approve_unit_then_export_sheets() {
        let ws = Workspace::new();
        let out_dir = ws.path("out");

        ws.run(&["approve-unit", "10"]).unwrap();
        let output = ws.run(&["export", "--out-dir", out_dir.as_str()]).unwrap();

        assert!(output.starts_with("sheet,rows,path\n"));
        assert!(output.contains("paypal,2,"));
        assert!(output.contains("mobile_money,1,"));
        let sheet = fs::read_to_string(Path::new(&out_dir).join("payouts_approved_paypal.csv")).unwrap();
        assert!(sheet.starts_with("request_id,beneficiary_id,name,email,paypal_email"));

        let processing = ws.run(&["stats", "processing"]).unwrap();
        assert!(processing.contains("count,4\n"));
    }

    #[test]
    fn test_import_reports_warnings() {
        let ws = Workspace::new();
        let report = ws.path("report.csv");
        fs::write(&report, "request_id,status\n4,paid\n99,paid\n").unwrap();

        let output = ws.run(&["import", report.as_str()]).unwrap();

        assert_eq!(
            output,
            "outcome,detail\napplied,1\nwarning,Report row at line 3 references unknown payout request 99\n"
        );
    }

    #[test]
    fn test_review_and_approve_without_directory() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("ledger.csv");
        fs::write(
            &ledger,
            LEDGER
                .replace("Z,,,,,,,,,\n2,", "Z,,paypal,,,,,ada@paypal.test,,\n2,")
                .replace("Z,,,,,,,,,\n3,", "Z,,paypal,,,,,ada@paypal.test,,\n3,"),
        )
        .unwrap();
        let ledger = ledger.display().to_string();
        let run_command = |command: &[&str]| -> Result<String, PayoutError> {
            let mut argv = vec!["program", "--ledger", ledger.as_str()];
            argv.extend_from_slice(command);
            let args = CliArgs::try_parse_from(argv).unwrap();
            let mut output = Vec::<u8>::new();
            run(&args, &mut output)?;
            Ok(String::from_utf8(output).unwrap())
        };

        let units = run_command(&["list", "review"]).unwrap();
        assert_eq!(
            units.lines().nth(1),
            Some("10,50.00,45.00,5.00,2024-01;2024-02,2,1;2,paypal,request")
        );

        let approved = run_command(&["approve-unit", "10"]).unwrap();
        assert_eq!(approved, "id,outcome,reason\n1,ok,\n2,ok,\n");

        let error = run_command(&["transition", "3", "processing"]).unwrap_err();
        assert_eq!(error, PayoutError::UnresolvedPaymentMethod { id: 3 });
        run_command(&["transition", "2", "processing"]).unwrap();

        let processing = run_command(&["stats", "processing"]).unwrap();
        assert!(processing.contains("count,2\n"));
    }

    #[test]
    fn test_missing_ledger_is_fatal() {
        let args = CliArgs::try_parse_from(["program", "--ledger", "nope.csv", "stats", "review"]).unwrap();
        let result = run(&args, &mut Vec::<u8>::new());
        assert!(matches!(result, Err(PayoutError::FileNotFound { .. })));
    }
}
