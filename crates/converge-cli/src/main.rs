//! Converge CLI - simulate entitlement waits against a flaky in-memory store
//!
//! ## Commands
//!
//! - `simulate`: run a wait against a scripted store and print the verdict
//! - `config`: print the poll configuration resolved from `CONVERGE_*` variables

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};

use converge_core::{PollConfig, SourceLocation, METRICS};
use converge_entitlement::{
    EntitlementReport, EntitlementSource, EntitlementWaiter, MemoryEntitlementSource,
    PurchaseOptions, TransactionRecord, TransactionState,
};

#[derive(Parser)]
#[command(name = "converge")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Wait out eventually-consistent entitlement state", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for a product to become active in a simulated store
    Simulate(SimulateArgs),

    /// Print the poll configuration resolved from the environment
    Config,
}

#[derive(Args, Debug, Clone)]
struct SimulateArgs {
    /// Product identifier to wait for
    #[arg(short, long, default_value = "pro.monthly")]
    product: String,

    /// Number of stale reads before the product shows up
    #[arg(long, default_value = "0")]
    stale: usize,

    /// Make the store flip the product on and off forever
    #[arg(long)]
    oscillate: bool,

    /// Fail the active-set query with this 0-based index
    #[arg(long)]
    fail_at: Option<usize>,

    /// Purchase the product first; stale reads become activation lag
    #[arg(long)]
    purchase: bool,

    /// Leave the transaction listing empty so the cross-check reports a mismatch
    #[arg(long)]
    no_transactions: bool,

    /// Highest attempt index (overrides CONVERGE_MAX_TRIES)
    #[arg(long)]
    max_tries: Option<u32>,

    /// Consecutive true results required (overrides CONVERGE_MIN_CONSECUTIVE)
    #[arg(long)]
    min_consecutive: Option<usize>,

    /// Late-phase sleep in milliseconds (overrides CONVERGE_SLEEP_MS)
    #[arg(long)]
    sleep_ms: Option<u64>,

    /// Fail on timeout instead of reporting it as inconclusive
    #[arg(long)]
    strict: bool,

    /// Print the report as JSON
    #[arg(long)]
    report_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    converge_core::init_tracing(cli.json, level);

    let result = match cli.command {
        Commands::Simulate(args) => cmd_simulate(&args).await,
        Commands::Config => cmd_config(),
    };
    METRICS.flush();
    result
}

fn resolve_config(args: &SimulateArgs) -> Result<PollConfig> {
    let mut config = PollConfig::from_env().context("Failed to read CONVERGE_* configuration")?;
    if let Some(max_tries) = args.max_tries {
        config.max_tries = max_tries;
    }
    if let Some(min_consecutive) = args.min_consecutive {
        config.min_consecutive = min_consecutive;
    }
    if let Some(sleep_ms) = args.sleep_ms {
        config.sleep_ms = sleep_ms;
    }
    if args.strict {
        config.strict_timeout = true;
    }
    config.validate()?;
    Ok(config)
}

fn build_store(args: &SimulateArgs) -> MemoryEntitlementSource {
    let mut store = MemoryEntitlementSource::new();

    if args.purchase {
        store = store.with_activation_lag(args.stale);
    } else {
        store = store
            .with_script(std::iter::repeat(Vec::<String>::new()).take(args.stale))
            .with_active([args.product.clone()]);
        if !args.no_transactions {
            store = store.with_transactions([TransactionRecord::new(
                args.product.clone(),
                TransactionState::Purchased,
            )]);
        }
    }
    if args.oscillate {
        store = store.oscillating(args.product.clone());
    }
    if let Some(index) = args.fail_at {
        store = store.fail_active_query_at(index);
    }
    store
}

async fn cmd_simulate(args: &SimulateArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let store = Arc::new(build_store(args));
    let source: Arc<dyn EntitlementSource> = store.clone();
    let waiter = EntitlementWaiter::new(source, config);
    let location = SourceLocation::new("converge simulate", 0);

    info!(product = %args.product, config = ?waiter.config(), "starting simulated wait");
    let result = if args.purchase {
        waiter
            .purchase_and_wait(&args.product, &PurchaseOptions::default(), location)
            .await
    } else {
        waiter.wait_for(&args.product, location).await
    };
    let report = result.with_context(|| format!("Waiting for {} failed", args.product))?;

    if args.report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, store.active_query_count());
    }
    Ok(())
}

fn print_report(report: &EntitlementReport, queries: usize) {
    match report.verdict.converged_at() {
        Some(attempt) => println!(
            "✓ {} converged at attempt {} ({}ms, {} active-set queries)",
            report.product_id,
            attempt,
            report.verdict.elapsed_ms(),
            queries
        ),
        None => println!(
            "⚠ {}",
            report.verdict.skip_reason().unwrap_or("inconclusive")
        ),
    }
    if let Some(mismatch) = &report.mismatch {
        println!(
            "  note: active without transaction {:?}, transaction without active {:?}",
            mismatch.active_without_transaction, mismatch.transaction_without_active
        );
    }
}

fn cmd_config() -> Result<()> {
    let config = PollConfig::from_env().context("Failed to read CONVERGE_* configuration")?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
