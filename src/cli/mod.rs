// CLI module
// Command-line interface, argument parsing and command dispatch

mod args;
mod commands;

pub use args::{CliArgs, Command, PeriodArgs, StrategyType};
pub use commands::run;

use clap::Parser;

/// Parse command-line arguments using clap
///
/// If parsing fails (e.g., invalid arguments, missing required arguments, or
/// --help flag), clap will automatically display an error message or help
/// text and exit the process.
///
/// # Returns
///
/// Returns a `CliArgs` struct with the parsed command-line arguments.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
