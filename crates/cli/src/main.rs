//! Forkpool CLI - run batches of builtin functions on a bounded worker pool

mod batch;
mod builtins;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tabled::{Table, Tabled};
use tracing::info;

use forkpool_core::{BackendKind, BatchOutcome, ExecutorConfig};
use logging::LogFormat;

#[derive(Parser)]
#[command(name = "forkpool")]
#[command(about = "Bounded-concurrency task executor", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log output format
    #[arg(long, env = logging::ENV_LOG_FORMAT, value_enum, default_value = "pretty")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch file
    Run {
        /// Batch file: [{"function": "...", "args": {...}}, ...]
        #[arg(short, long)]
        batch: PathBuf,

        #[command(flatten)]
        pool: PoolArgs,
    },

    /// Run inc(0..=8) plus inc("a") to show results and failures side by side
    Demo {
        #[command(flatten)]
        pool: PoolArgs,
    },

    /// List builtin functions
    Functions,
}

#[derive(clap::Args)]
struct PoolArgs {
    /// Backend: isolated (process per task) or shared (thread pool)
    #[arg(long, default_value = "isolated")]
    backend: BackendKind,

    /// Maximum number of simultaneously active workers
    #[arg(short, long, env = "FORKPOOL_CONCURRENCY")]
    concurrency: Option<i64>,

    /// Print the full outcome as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct FailureRow {
    function: String,
    args: String,
    message: String,
}

#[derive(Tabled)]
struct FunctionRow {
    name: String,
    description: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format)?;

    let config = ExecutorConfig::from_env().context("Invalid FORKPOOL_* configuration")?;

    match cli.command {
        Commands::Run { batch, pool } => {
            let batch = batch::load(&batch)?;
            run_batch(batch, pool, config)
        }
        Commands::Demo { pool } => run_batch(batch::demo(), pool, config),
        Commands::Functions => {
            let rows: Vec<FunctionRow> = builtins::registry()
                .into_iter()
                .map(|(function, description)| FunctionRow {
                    name: function.name().to_string(),
                    description: description.to_string(),
                })
                .collect();
            println!("{}", Table::new(rows));
            Ok(())
        }
    }
}

fn run_batch(batch: batch::Batch, pool: PoolArgs, config: ExecutorConfig) -> Result<()> {
    let concurrency = pool
        .concurrency
        .unwrap_or(config.default_concurrency as i64);
    let executor = forkpool_infra_system::default_executor(config);

    info!(
        tasks = batch.len(),
        backend = %pool.backend,
        concurrency,
        "Submitting batch"
    );

    let outcome = executor
        .execute(batch.functions, batch.args, concurrency, pool.backend)
        .context("Batch execution failed")?;

    if pool.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    Ok(())
}

fn print_outcome(outcome: &BatchOutcome) {
    println!("{}", format!("Batch {}", outcome.batch_id).cyan().bold());
    println!();
    println!("  {} {}", "Backend:".bold(), outcome.backend);
    println!("  {} {}", "Workers started:".bold(), outcome.stats.workers_started);
    println!(
        "  {} {}",
        "Peak active workers:".bold(),
        outcome.stats.peak_active_workers
    );
    println!("  {} {} ms", "Duration:".bold(), outcome.stats.duration_ms);
    println!();

    let results: Vec<String> = outcome.results.iter().map(|v| v.to_string()).collect();
    println!(
        "  {} {} [{}]",
        "✓".green(),
        format!("{} results", outcome.results.len()).green().bold(),
        results.join(", ")
    );

    if outcome.failures.is_empty() {
        println!("  {} {}", "✓".green(), "no failures".green());
        return;
    }

    println!(
        "  {} {}",
        "✗".red(),
        format!("{} failures", outcome.failures.len()).red().bold()
    );
    println!();

    let rows: Vec<FailureRow> = outcome
        .failures
        .iter()
        .map(|failure| FailureRow {
            function: failure.function_name.clone(),
            args: serde_json::Value::Object(failure.args.clone()).to_string(),
            message: failure.message.clone(),
        })
        .collect();
    println!("{}", Table::new(rows));
}
