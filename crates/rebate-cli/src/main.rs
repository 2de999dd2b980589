mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::aliases::AliasesArgs;
use commands::calculate::CalculateArgs;
use commands::summarize::SummarizeArgs;
use commands::tiers::TiersArgs;

/// Dealer-group penetration summaries and rebate-tier calculations
#[derive(Parser)]
#[command(
    name = "rebate",
    version,
    about = "Dealer-group penetration summaries and rebate-tier calculations",
    long_about = "Aggregates subscription history into per-group TAM/SAM/DUM summaries \
                  and computes monthly and annual rebates, net revenue, and gain/loss \
                  for every tier of an editable penetration tier table."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log debug detail to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate subscription history into per-dealer-group summaries
    Summarize(SummarizeArgs),
    /// Resolve a group's tier and compute rebates for every tier
    Calculate(CalculateArgs),
    /// Show a tier table and its coverage/overlap findings
    Tiers(TiersArgs),
    /// List the column names accepted for each summary field
    Aliases(AliasesArgs),
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
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Summarize(args) => commands::summarize::run_summarize(args),
        Commands::Calculate(args) => commands::calculate::run_calculate(args),
        Commands::Tiers(args) => commands::tiers::run_tiers(args),
        Commands::Aliases(args) => commands::aliases::run_aliases(args),
        Commands::Version => {
            println!("rebate {}", env!("CARGO_PKG_VERSION"));
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
