//! Backtest CLI — fetch, inspect and backtest daily price data.
//!
//! Commands:
//! - `fetch` — download daily bars from Polygon into the CSV store
//! - `range` — show the stored date range for a symbol
//! - `strategies` — list the available strategies
//! - `run` — execute a backtest from a TOML config file and/or flags

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use backtest_core::data::{CsvBarStore, DataProvider, PolygonProvider};
use backtest_core::strategy::{available_strategies, StrategyKind};
use backtest_runner::config::API_KEY_ENV;
use backtest_runner::report::{render_text, write_executions_csv, write_json};
use backtest_runner::{run_backtest, BacktestConfig, LoadOptions};

#[derive(Parser)]
#[command(name = "backtest", about = "Moving-average backtester for daily stock data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily bars from Polygon and merge them into the store.
    Fetch {
        /// Ticker symbol (e.g., AAPL).
        symbol: String,

        /// Start date (YYYY-MM-DD). Defaults to one year ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Store directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        store_dir: PathBuf,

        /// Polygon API key. Falls back to POLYGON_API_KEY.
        #[arg(long)]
        api_key: Option<String>,

        /// Retries on rate limiting, server errors and timeouts.
        #[arg(long, default_value_t = 3)]
        retries: u32,
    },
    /// Show the first and last stored dates for a symbol.
    Range {
        symbol: String,

        /// Store directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        store_dir: PathBuf,
    },
    /// List the available strategies.
    Strategies,
    /// Execute a backtest. Flags override values from --config.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        symbol: Option<String>,

        /// SMA or EMA.
        #[arg(long)]
        strategy: Option<String>,

        /// Observation window in bars.
        #[arg(long)]
        window: Option<usize>,

        /// Stop loss as a fraction of the entry price (0.0 - 1.0).
        #[arg(long)]
        stop_loss: Option<f64>,

        /// Take profit as a fraction of the entry price (0.0 - 1.0).
        #[arg(long)]
        take_profit: Option<f64>,

        /// Initial cash balance.
        #[arg(long)]
        cash: Option<f64>,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,

        /// Offline mode: never fetch missing data.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Store directory. Overrides [data] store_dir.
        #[arg(long)]
        store_dir: Option<PathBuf>,

        /// Write the full result as JSON.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the execution tape as CSV.
        #[arg(long)]
        executions: Option<PathBuf>,
    },
}

/// Overrides collected from `run` flags.
struct RunOverrides {
    symbol: Option<String>,
    strategy: Option<String>,
    window: Option<usize>,
    stop_loss: Option<f64>,
    take_profit: Option<f64>,
    cash: Option<f64>,
    start: Option<String>,
    end: Option<String>,
    store_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            symbol,
            start,
            end,
            store_dir,
            api_key,
            retries,
        } => run_fetch(&symbol, start, end, store_dir, api_key, retries),
        Commands::Range { symbol, store_dir } => run_range(&symbol, store_dir),
        Commands::Strategies => {
            run_strategies();
            Ok(())
        }
        Commands::Run {
            config,
            symbol,
            strategy,
            window,
            stop_loss,
            take_profit,
            cash,
            start,
            end,
            offline,
            store_dir,
            output,
            executions,
        } => {
            let overrides = RunOverrides {
                symbol,
                strategy,
                window,
                stop_loss,
                take_profit,
                cash,
                start,
                end,
                store_dir,
            };
            run_backtest_cmd(config, overrides, offline, output, executions)
        }
    }
}

/// `RUST_LOG` wins; otherwise `info`.
fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

fn resolve_api_key(flag: Option<String>) -> Option<String> {
    flag.filter(|k| !k.trim().is_empty())
        .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
}

fn run_fetch(
    symbol: &str,
    start: Option<String>,
    end: Option<String>,
    store_dir: PathBuf,
    api_key: Option<String>,
    retries: u32,
) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let start_date = start
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| today - chrono::Duration::days(365));
    let end_date = end.as_deref().map(parse_date).transpose()?.unwrap_or(today);
    if start_date > end_date {
        bail!("start date {start_date} is after end date {end_date}");
    }

    let Some(key) = resolve_api_key(api_key) else {
        bail!("no API key: pass --api-key or set {API_KEY_ENV}");
    };
    let provider = PolygonProvider::new(key)?.with_max_retries(retries);
    let store = CsvBarStore::new(store_dir);

    let fetched = provider.fetch(symbol, start_date, end_date)?;
    if fetched.bars.is_empty() {
        bail!("no bars returned for {symbol} between {start_date} and {end_date}");
    }
    let total = store.insert(symbol, &fetched.bars)?;
    println!(
        "Fetched {} bars for {}; {} rows stored in {}",
        fetched.bars.len(),
        fetched.symbol,
        total,
        store.root().display()
    );
    Ok(())
}

fn run_range(symbol: &str, store_dir: PathBuf) -> Result<()> {
    let store = CsvBarStore::new(store_dir);
    match store.available_range(symbol)? {
        Some((first, last)) => println!("Available dates for {symbol} are {first} to {last}"),
        None => println!("No stored data for {symbol} in {}", store.root().display()),
    }
    Ok(())
}

fn run_strategies() {
    println!("Available Strategies:");
    for name in available_strategies() {
        let description = name
            .parse::<StrategyKind>()
            .map(|k| k.description())
            .unwrap_or_default();
        println!("  {name:<5} {description}");
    }
}

fn run_backtest_cmd(
    config_path: Option<PathBuf>,
    overrides: RunOverrides,
    offline: bool,
    output: Option<PathBuf>,
    executions: Option<PathBuf>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => BacktestConfig::from_file(&path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => BacktestConfig::default(),
    };
    apply_overrides(&mut config, overrides)?;
    config.validate()?;

    let opts = LoadOptions {
        start: config.backtest.start_date,
        end: config.backtest.end_date,
        offline,
    };
    let store = CsvBarStore::new(&config.data.store_dir);
    let provider = match (offline, config.api_key()) {
        (false, Some(key)) => Some(PolygonProvider::new(key)?),
        _ => None,
    };
    let provider_ref: Option<&dyn DataProvider> = provider.as_ref().map(|p| p as &dyn DataProvider);

    let result = run_backtest(&config, &store, provider_ref, &opts)?;
    print!("{}", render_text(&result));

    if let Some(path) = output {
        write_json(&result, &path)?;
        println!("Result saved to: {}", path.display());
    }
    if let Some(path) = executions {
        write_executions_csv(&result, &path)?;
        println!("Executions saved to: {}", path.display());
    }
    Ok(())
}

fn apply_overrides(config: &mut BacktestConfig, o: RunOverrides) -> Result<()> {
    if let Some(symbol) = o.symbol {
        config.backtest.symbol = symbol;
    }
    if let Some(name) = o.strategy {
        config.strategy.kind = name.parse()?;
    }
    if let Some(window) = o.window {
        config.strategy.observation_window = window;
    }
    if let Some(pct) = o.stop_loss {
        config.strategy.stop_loss_pct = pct;
    }
    if let Some(pct) = o.take_profit {
        config.strategy.take_profit_pct = pct;
    }
    if let Some(cash) = o.cash {
        config.backtest.initial_cash = cash;
    }
    if let Some(start) = o.start {
        config.backtest.start_date = parse_date(&start)?;
    }
    if let Some(end) = o.end {
        config.backtest.end_date = parse_date(&end)?;
    }
    if let Some(dir) = o.store_dir {
        config.data.store_dir = dir;
    }
    Ok(())
}
