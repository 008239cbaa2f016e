mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::bond::{AnalyzeArgs, ScheduleArgs, SweepArgs};

/// Fixed-rate bond cash flows, yield-to-market and duration
#[derive(Parser)]
#[command(
    name = "bondcf",
    version,
    about = "Fixed-rate bond cash flows, yield-to-market and duration",
    long_about = "A CLI for computing a fixed-rate bullet bond's payment schedule \
                  with decimal precision, plus yield-to-market (IRR against a market \
                  price) and Macaulay duration."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log solver progress to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the periodic cash-flow schedule
    Schedule(ScheduleArgs),
    /// Schedule plus yield-to-market and Macaulay duration
    Analyze(AnalyzeArgs),
    /// Yield and duration across a range of purchase prices
    Sweep(SweepArgs),
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

fn init_tracing(verbose: bool) {
    let default_directives = if verbose {
        "bond_cashflow_core=debug,bondcf=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    // stdout carries the result; logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::bond::run_schedule(args),
        Commands::Analyze(args) => commands::bond::run_analyze(args),
        Commands::Sweep(args) => commands::bond::run_sweep(args),
        Commands::Version => {
            println!("bondcf {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
