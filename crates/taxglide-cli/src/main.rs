mod commands;
mod output;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process;

use taxglide_core::TaxGlideError;

use commands::calc::CalcArgs;
use commands::compare::CompareBracketsArgs;
use commands::optimize::OptimizeArgs;
use commands::scan::ScanArgs;
use commands::validate::ValidateArgs;

/// Swiss income tax calculations, config driven
#[derive(Parser)]
#[command(
    name = "taxglide",
    version,
    about = "Swiss income tax calculations and deduction optimisation",
    long_about = "Computes Swiss personal income taxes (federal + canton + municipality) \
                  with exact decimal arithmetic, and searches for the single deduction \
                  with the best return on investment."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit structured JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Directory with per-year configuration documents
    #[arg(long, global = true, default_value = "configs")]
    config_root: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the federal + cantonal tax breakdown
    Calc(CalcArgs),
    /// Search for the deduction with the best return on investment
    Optimize(OptimizeArgs),
    /// Tabulate taxes and ROI over a deduction range
    Scan(ScanArgs),
    /// Show federal and cantonal brackets before and after a deduction
    CompareBrackets(CompareBracketsArgs),
    /// Validate a year's configuration document
    Validate(ValidateArgs),
    /// Print version, schema and supported years
    Version,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut csv_requested = false;
    let result = match cli.command {
        Commands::Calc(args) => commands::calc::run(&args, &cli.config_root),
        Commands::Optimize(args) => commands::optimize::run(&args, &cli.config_root),
        Commands::Scan(args) => {
            csv_requested = args.csv;
            commands::scan::run(&args, &cli.config_root)
        }
        Commands::CompareBrackets(args) => commands::compare::run(&args, &cli.config_root),
        Commands::Validate(args) => commands::validate::run(&args, &cli.config_root),
        Commands::Version => commands::version(&cli.config_root),
    };

    match result {
        Ok(value) => {
            if cli.json {
                output::json::print_success(&value);
            } else if csv_requested {
                output::csv_out::print_csv(&value);
            } else {
                output::table::print_table(&value);
            }
            // A validation report with findings is still rendered, but the
            // exit code signals the failure.
            if value.get("ok").and_then(|ok| ok.as_bool()) == Some(false) {
                process::exit(5);
            }
            process::exit(0);
        }
        Err(e) => {
            if cli.json {
                output::json::print_error(&e);
            } else {
                eprintln!("{}: {}", "error".red().bold(), e);
            }
            process::exit(exit_code(&e));
        }
    }
}

fn exit_code(e: &TaxGlideError) -> i32 {
    e.exit_code()
}
