use crate::core::stage::Stage;
use crate::strategy::BatchConfig;
use crate::types::{BeneficiaryId, PayoutStatus, PeriodFilter, RequestId};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Review, approve, export and reconcile beneficiary payouts
#[derive(Parser, Debug)]
#[command(name = "payout-engine")]
#[command(about = "Review, approve, export and reconcile beneficiary payouts", long_about = None)]
pub struct CliArgs {
    /// Ledger snapshot CSV; rewritten in place by mutating commands
    #[arg(long = "ledger", value_name = "CSV", help = "Path to the ledger snapshot CSV")]
    pub ledger: PathBuf,

    /// Beneficiary directory CSV
    #[arg(
        long = "directory",
        value_name = "CSV",
        help = "Path to the beneficiary directory CSV (names, emails, default payment methods)"
    )]
    pub directory: Option<PathBuf>,

    /// Execution strategy for bulk transitions and report imports
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Execution strategy: 'sync' for sequential or 'async' for concurrent"
    )]
    pub strategy: StrategyType,

    /// Number of report rows per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of report rows per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

/// Operator commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List a stage: review units, or raw requests for the other stages
    List {
        #[arg(value_name = "STAGE", help = "review | approved | processing | history")]
        stage: Stage,

        #[command(flatten)]
        period: PeriodArgs,

        /// List the review stage's orphaned requests instead of its units
        #[arg(long = "orphaned")]
        orphaned: bool,
    },

    /// Move one request to a new status
    Transition {
        #[arg(value_name = "ID")]
        id: RequestId,

        #[arg(value_name = "STATUS")]
        status: PayoutStatus,
    },

    /// Send a processing or payment_method_not_found request back to pending
    Revert {
        #[arg(value_name = "ID")]
        id: RequestId,
    },

    /// Move many requests to a new status, reporting each one
    Bulk {
        #[arg(value_name = "STATUS")]
        status: PayoutStatus,

        #[arg(value_name = "ID", required = true, num_args = 1..)]
        ids: Vec<RequestId>,
    },

    /// Approve every pending request of one beneficiary
    ApproveUnit {
        #[arg(value_name = "BENEFICIARY")]
        beneficiary: BeneficiaryId,
    },

    /// Write one export sheet per payment method type
    Export {
        #[arg(value_name = "STAGE", default_value = "approved")]
        stage: Stage,

        #[command(flatten)]
        period: PeriodArgs,

        /// Directory the sheets are written to
        #[arg(long = "out-dir", value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,

        /// Leave exported requests in `approved`
        #[arg(long = "no-advance")]
        no_advance: bool,
    },

    /// Apply a provider completion report
    Import {
        #[arg(value_name = "REPORT")]
        report: PathBuf,
    },

    /// Counts and totals for a stage
    Stats {
        #[arg(value_name = "STAGE")]
        stage: Stage,

        #[command(flatten)]
        period: PeriodArgs,
    },
}

impl Command {
    /// Whether the command writes the ledger back
    pub fn mutates_ledger(&self) -> bool {
        match self {
            Command::List { .. } | Command::Stats { .. } => false,
            Command::Export { stage, no_advance, .. } => *stage == Stage::Approved && !no_advance,
            _ => true,
        }
    }
}

/// Month / year filter, honored by the `history` stage only
#[derive(Args, Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodArgs {
    #[arg(long = "month", value_name = "MONTH", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    #[arg(long = "year", value_name = "YEAR")]
    pub year: Option<i32>,
}

impl From<PeriodArgs> for PeriodFilter {
    fn from(args: PeriodArgs) -> Self {
        PeriodFilter {
            month: args.month,
            year: args.year,
        }
    }
}

/// Available execution strategies for batch operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Uses the CLI values if provided, or falls back to defaults. Zero
    /// values are replaced by defaults with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }
}
