use alerter::AlertEvaluator;
use anyhow::Context;
use api_client::YahooClient;
use backtester::DcaBacktester;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use configuration::Config;
use core_types::ContributionPlan;
use fetcher::{FetchReport, ResilientFetcher};
use indicatif::ProgressBar;
use reporter::{AlertLog, ObservationWriter};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// The main entry point for the Cadence DCA backtesting and alerting tool.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Load the application configuration
    let config = match configuration::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {}", e);
            std::process::exit(1);
        }
    };

    // Execute the appropriate command
    let result = match cli.command {
        Commands::Backtest(args) => handle_backtest(args, &config).await,
        Commands::Alerts(args) => handle_alerts(args, &config).await,
        Commands::Snapshot(args) => handle_snapshot(args, &config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Simulates dollar-cost-averaging against an index and raises price alerts.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monthly DCA simulation against the reference index.
    Backtest(BacktestArgs),
    /// Check the configured target prices against the latest closes.
    Alerts(AlertsArgs),
    /// Append each symbol's most recent observations to per-symbol CSV files.
    Snapshot(SnapshotArgs),
}

#[derive(Parser)]
struct BacktestArgs {
    /// Reference symbol to backtest against (defaults to the configured one).
    #[arg(long)]
    symbol: Option<String>,

    /// First contribution month (format: YYYY-MM-DD; defaults to the configured date).
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Also write the ledger to this CSV file.
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Parser)]
struct AlertsArgs {
    /// The append-only alert log file.
    #[arg(long, default_value = "alerts.csv")]
    log: PathBuf,
}

#[derive(Parser)]
struct SnapshotArgs {
    /// The symbols to snapshot.
    #[arg(long, required = true, num_args = 1..)]
    symbols: Vec<String>,

    /// Directory receiving the per-symbol CSV files.
    #[arg(long, default_value = "observations")]
    out_dir: PathBuf,

    /// How many of the most recent observations to append per symbol.
    #[arg(long, default_value_t = 5)]
    tail: usize,
}

// ==============================================================================
// Command Handlers
// ==============================================================================

/// Fetches the requested symbols behind a spinner and reports any symbols
/// that were given up on. A partial (or empty) result is not an error here;
/// each handler decides what absence means for its command.
async fn fetch_with_spinner(config: &Config, symbols: &[String]) -> FetchReport {
    let fetcher = ResilientFetcher::new(Arc::new(YahooClient::new()), &config.fetch);

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Fetching {} symbol(s)...", symbols.len()));
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));

    let report = fetcher
        .fetch(symbols, &config.fetch.period, &config.fetch.interval)
        .await;

    spinner.finish_and_clear();

    for failure in &report.failures {
        eprintln!(
            "No data for {} after {} attempt(s): {}",
            failure.symbol, failure.attempts, failure.reason
        );
    }
    report
}

async fn handle_backtest(args: BacktestArgs, config: &Config) -> anyhow::Result<()> {
    let symbol = args
        .symbol
        .unwrap_or_else(|| config.backtest.reference_symbol.clone());
    let start_date = args.start.unwrap_or(config.backtest.start_date);
    let plan = ContributionPlan::new(config.backtest.contributions.clone());

    tracing::info!(%symbol, %start_date, periods = plan.len(), "Running DCA backtest.");

    let report = fetch_with_spinner(config, std::slice::from_ref(&symbol)).await;
    let reference = report
        .series
        .get(&symbol)
        .with_context(|| format!("no usable price data for {}", symbol))?;

    let ledger = DcaBacktester::new().run(&plan, reference, start_date)?;

    println!("{}", reporter::render_ledger(&ledger));
    match ledger.last() {
        Some(last) => println!(
            "Invested {} | Value {} | Unrealized gain {}",
            last.cumulative_invested,
            last.portfolio_value.round_dp(2),
            last.unrealized_gain.round_dp(2)
        ),
        None => println!("No contribution period could be processed for {}.", symbol),
    }

    if let Some(path) = args.csv {
        reporter::write_ledger_csv(&ledger, &path)?;
        println!("Ledger written to {}", path.display());
    }

    Ok(())
}

async fn handle_alerts(args: AlertsArgs, config: &Config) -> anyhow::Result<()> {
    if config.alerts.targets.is_empty() {
        println!("No alert targets configured.");
        return Ok(());
    }

    // Sorted symbol order keeps the alert sequence stable across runs.
    let mut symbols: Vec<String> = config.alerts.targets.keys().cloned().collect();
    symbols.sort();

    let report = fetch_with_spinner(config, &symbols).await;

    let latest_prices: Vec<(String, Decimal)> = symbols
        .iter()
        .filter_map(|symbol| {
            report
                .series
                .get(symbol)
                .and_then(|series| series.latest_close())
                .map(|close| (symbol.clone(), close))
        })
        .collect();

    let alerts = AlertEvaluator::new().evaluate(&latest_prices, &config.alerts.targets);

    if alerts.is_empty() {
        println!("No thresholds crossed.");
    }
    for alert in &alerts {
        println!(
            "{} is {} target {} (observed {})",
            alert.symbol, alert.direction, alert.target, alert.observed
        );
    }

    AlertLog::new(&args.log).append(&alerts)?;

    Ok(())
}

async fn handle_snapshot(args: SnapshotArgs, config: &Config) -> anyhow::Result<()> {
    let report = fetch_with_spinner(config, &args.symbols).await;

    let mut writer = ObservationWriter::new(&args.out_dir);
    let mut fetched: Vec<&String> = report.series.keys().collect();
    fetched.sort();

    for symbol in fetched {
        let series = &report.series[symbol];
        let path = writer.append(symbol, series, args.tail)?;
        println!(
            "{}: appended {} row(s) to {}",
            symbol,
            args.tail.min(series.len()),
            path.display()
        );
    }

    Ok(())
}
