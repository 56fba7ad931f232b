//! CLI for kerntime
//!
//! Commands:
//! - measure: profile every common benchmark and write the kernel timing dataset
//! - list: show the benchmarks a run would measure and their cache state
//! - parse: parse a single profiler trace into records
//! - summary: per-kernel accuracy of an existing dataset or cache file
//! - config: print the effective configuration

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "kerntime")]
#[command(about = "kerntime - GPU kernel timing collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Profile all benchmarks common to the configured suites
    Measure(commands::measure::MeasureArgs),

    /// List common benchmarks and their cache state
    List(commands::list::ListArgs),

    /// Parse one profiler trace and print its records as CSV
    Parse(commands::parse::ParseArgs),

    /// Print per-kernel accuracy of a dataset or cache file
    Summary(commands::summary::SummaryArgs),

    /// Print the effective configuration as TOML
    Config(commands::show_config::ShowConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Measure(args) => {
            init_tracing(args.verbose);
            commands::measure::run(args).await
        }
        Commands::List(args) => {
            init_tracing(args.verbose);
            commands::list::run(args)
        }
        Commands::Parse(args) => {
            init_tracing(args.verbose);
            commands::parse::run(args)
        }
        Commands::Summary(args) => commands::summary::run(args),
        Commands::Config(args) => commands::show_config::run(args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
