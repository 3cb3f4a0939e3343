mod bounds;
mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::model::{AssumptionArgs, ExportArgs, ModelArgs};
use commands::time_value::{AnnuityArgs, IrrArgs};

/// Financial model for solar PV portfolios
#[derive(Parser)]
#[command(
    name = "pvfm",
    version,
    about = "Financial model for solar PV portfolios",
    long_about = "Computes year-1 economics, a multi-year cash-flow projection, \
                  unlevered and equity IRR and DSCR for a selection of PV sites \
                  from a portfolio CSV and a set of techno-economic assumptions."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level (off, error, warn, info, debug, trace); PVFM_LOG_LEVEL wins
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full model: year-1 snapshot, projection and KPIs
    Model(ModelArgs),
    /// Year-1 economics per object
    Snapshot(ModelArgs),
    /// Year-by-year cash-flow projection
    Cashflows(ModelArgs),
    /// CAPEX, IRRs and DSCR summary
    Kpis(ModelArgs),
    /// Write the cash-flow projection to a CSV file
    Export(ExportArgs),
    /// Show input ranges, defaults and the assumptions in effect
    Assumptions(AssumptionArgs),
    /// Internal rate of return of a cash-flow series
    Irr(IrrArgs),
    /// Constant annuity payment for a loan
    Annuity(AnnuityArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_level.as_deref()) {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Model(args) => commands::model::run_model(args),
        Commands::Snapshot(args) => commands::model::run_snapshot(args),
        Commands::Cashflows(args) => commands::model::run_cashflows(args),
        Commands::Kpis(args) => commands::model::run_kpis(args),
        Commands::Export(args) => commands::model::run_export(args),
        Commands::Assumptions(args) => commands::model::run_assumptions(args),
        Commands::Irr(args) => commands::time_value::run_irr(args),
        Commands::Annuity(args) => commands::time_value::run_annuity(args),
        Commands::Version => {
            println!("pvfm {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
