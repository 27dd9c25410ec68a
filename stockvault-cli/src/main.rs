//! StockVault CLI: fetch, refresh, sweep and status commands.
//!
//! Commands:
//! - `fetch`: make sure a date range is stored, then print indicators and a trend summary
//! - `refresh`: top up one symbol if its latest stored date is stale
//! - `sweep`: refresh every tracked symbol
//! - `status`: list tracked symbols with their latest stored date, optionally with a trend table

use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use stockvault_core::analysis::{assess_with, summarize, TrendColumns, TrendReport};
use stockvault_core::data::{SeriesStore, SqliteStore, SymbolDirectory, YahooQuoteSource};
use stockvault_core::domain::SymbolInfo;
use stockvault_core::indicators::{compute, IndicatorRow, IndicatorSeries};
use stockvault_core::{AppConfig, BackfillEngine};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "stockvault.toml";

#[derive(Parser)]
#[command(
    name = "stockvault",
    about = "StockVault: daily price store with incremental backfill and indicators"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to ./stockvault.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides [store] path).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ensure a date range is stored, then compute indicators over it.
    Fetch {
        /// Symbol (e.g., 2330.TW, or a bare code found in the stock list).
        symbol: String,

        /// Start date (YYYY-MM-DD). Defaults to the configured lookback.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Print every row as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Number of most recent rows to show in the table.
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
    /// Refresh one symbol if its latest stored date is too old.
    Refresh {
        symbol: String,

        /// Allowed age of the latest stored date, in days.
        #[arg(long)]
        tolerance: Option<i64>,
    },
    /// Refresh every tracked symbol, one at a time.
    Sweep {
        /// Allowed age of the latest stored date, in days.
        #[arg(long)]
        tolerance: Option<i64>,
    },
    /// List tracked symbols with their latest stored date.
    Status {
        /// Also print a one-line trend summary per symbol from stored data.
        #[arg(long, default_value_t = false)]
        trend: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref(), Path::new(DEFAULT_CONFIG_PATH))?;
    if let Some(db) = cli.db {
        config.store.path = db;
    }

    match cli.command {
        Commands::Fetch {
            symbol,
            start,
            end,
            json,
            rows,
        } => run_fetch(&config, &symbol, start, end, json, rows),
        Commands::Refresh { symbol, tolerance } => run_refresh(&config, &symbol, tolerance),
        Commands::Sweep { tolerance } => run_sweep(&config, tolerance),
        Commands::Status { trend } => run_status(&config, trend),
    }
}

fn build_engine(config: &AppConfig) -> Result<BackfillEngine<SqliteStore, YahooQuoteSource>> {
    let store = SqliteStore::open(&config.store.path)?;
    let source = YahooQuoteSource::new(&config.quotes)?;
    let directory = SymbolDirectory::load_or_empty(&config.directory.stock_list)?;
    info!(
        store = %config.store.path.display(),
        directory_entries = directory.len(),
        "engine ready"
    );
    Ok(BackfillEngine::new(store, source, directory).with_lookback_days(config.refresh.lookback_days))
}

fn parse_date(value: Option<String>, default: NaiveDate) -> Result<NaiveDate> {
    match value {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD")),
        None => Ok(default),
    }
}

fn run_fetch(
    config: &AppConfig,
    symbol: &str,
    start: Option<String>,
    end: Option<String>,
    json: bool,
    rows: usize,
) -> Result<()> {
    let engine = build_engine(config)?;
    let symbol = engine.directory().qualify(symbol);

    let today = Local::now().date_naive();
    let end_date = parse_date(end, today)?;
    let start_date = parse_date(start, end_date - Duration::days(config.refresh.lookback_days))?;
    if start_date > end_date {
        bail!("--start ({start_date}) must not be after --end ({end_date})");
    }

    let series = engine.ensure_range(&symbol, start_date, end_date)?;
    if series.is_empty() {
        println!("No data for {symbol} between {start_date} and {end_date}");
        return Ok(());
    }
    if !series.covers_through(end_date) {
        info!(
            %symbol,
            last = ?series.last_date(),
            %end_date,
            "provider has nothing newer than the last stored date"
        );
    }

    let indicators = compute(series.points(), &config.indicators)?;
    let report = assess_with(&indicators, &TrendColumns::from_options(&config.indicators));

    if json {
        let out = serde_json::json!({
            "symbol": symbol,
            "rows": indicators.rows(),
            "trend": report,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let name = engine
        .store()
        .symbol_info(&symbol)?
        .map(|info| info.display_name)
        .unwrap_or_else(|| engine.directory().display_name(&symbol).to_string());
    println!("{symbol} ({name}): {} rows, {start_date} to {end_date}", series.len());
    println!();

    let all_rows = indicators.rows();
    let shown = &all_rows[all_rows.len().saturating_sub(rows)..];
    print_rows(shown, &TrendColumns::from_options(&config.indicators));

    if let Some(report) = report {
        println!();
        print_report(&report);
    }

    Ok(())
}

fn run_refresh(config: &AppConfig, symbol: &str, tolerance: Option<i64>) -> Result<()> {
    let engine = build_engine(config)?;
    let symbol = engine.directory().qualify(symbol);
    let tolerance = tolerance.unwrap_or(config.refresh.tolerance_days);

    let fetched = engine.refresh_if_stale(&symbol, tolerance)?;
    let latest = engine.store().latest_date(&symbol)?;
    let latest = latest.map_or_else(|| "none".to_string(), |d| d.to_string());
    if fetched {
        println!("{symbol}: refreshed, latest stored date {latest}");
    } else {
        println!("{symbol}: up to date ({latest})");
    }
    Ok(())
}

fn run_sweep(config: &AppConfig, tolerance: Option<i64>) -> Result<()> {
    let engine = build_engine(config)?;
    let tolerance = tolerance.unwrap_or(config.refresh.tolerance_days);

    let summary = engine.refresh_all(tolerance)?;
    println!(
        "Checked {} symbols: {} refreshed, {} up to date",
        summary.checked, summary.refreshed, summary.up_to_date
    );
    Ok(())
}

fn run_status(config: &AppConfig, trend: bool) -> Result<()> {
    let store = SqliteStore::open(&config.store.path)?;
    let tracked = store.tracked_symbols()?;

    if tracked.is_empty() {
        println!("No tracked symbols in {}", config.store.path.display());
        return Ok(());
    }

    println!("Store: {}", config.store.path.display());
    println!("Symbols: {}", tracked.len());
    println!();
    println!(
        "{:<12} {:<24} {:<6} {:<12} {:>8}",
        "Symbol", "Name", "Market", "Latest", "Rows"
    );
    println!("{}", "-".repeat(66));
    for info in &tracked {
        let latest = store
            .latest_date(&info.symbol)?
            .map_or_else(|| "-".to_string(), |d| d.to_string());
        let rows = store.row_count(&info.symbol)?;
        println!(
            "{:<12} {:<24} {:<6} {:<12} {:>8}",
            info.symbol,
            truncate(&info.display_name, 24),
            info.market_type,
            latest,
            rows
        );
    }

    if trend {
        println!();
        print_summary(&store, &tracked, config)?;
    }
    Ok(())
}

/// Latest-row trend for every tracked symbol, computed from stored data only.
fn print_summary(store: &SqliteStore, tracked: &[SymbolInfo], config: &AppConfig) -> Result<()> {
    let mut computed: Vec<IndicatorSeries> = Vec::with_capacity(tracked.len());
    for info in tracked {
        let Some(latest) = store.latest_date(&info.symbol)? else {
            continue;
        };
        let start = latest - Duration::days(config.refresh.lookback_days);
        let points = store.load(&info.symbol, start, latest)?;
        computed.push(compute(&points, &config.indicators)?);
    }

    let reports = summarize(&computed, &TrendColumns::from_options(&config.indicators));
    println!(
        "{:<12} {:<12} {:>10} {:>8} {:>8} {:<9} {:<11} {:<8}",
        "Symbol", "Date", "Close", "Chg%", "RSI", "Trend", "MACD", "Advice"
    );
    println!("{}", "-".repeat(86));
    for report in &reports {
        println!(
            "{:<12} {:<12} {:>10.2} {:>+8.2} {:>8} {:<9} {:<11} {:<8}",
            report.symbol,
            report.trade_date.to_string(),
            report.close,
            report.change_pct,
            fmt_opt(report.rsi),
            report.trend.to_string(),
            report.macd_bias.to_string(),
            report.suggestion.to_string(),
        );
    }
    Ok(())
}

fn print_rows(rows: &[IndicatorRow], columns: &TrendColumns) {
    println!(
        "{:<12} {:>10} {:>12} {:>10} {:>10} {:>8} {:>9} {:>9}",
        "Date", "Close", "Volume", columns.ma_short, columns.ma_long, "RSI", "MACD", "Signal"
    );
    println!("{}", "-".repeat(86));
    for row in rows {
        println!(
            "{:<12} {:>10.2} {:>12} {:>10} {:>10} {:>8} {:>9} {:>9}",
            row.point.trade_date.to_string(),
            row.point.close,
            row.point.volume,
            fmt_opt(row.get(&columns.ma_short)),
            fmt_opt(row.get(&columns.ma_long)),
            fmt_opt(row.get("rsi")),
            fmt_opt(row.get("macd")),
            fmt_opt(row.get("signal")),
        );
    }
}

fn print_report(report: &TrendReport) {
    println!("Trend for {} on {}", report.symbol, report.trade_date);
    println!("  Close:       {:.2} ({:+.2}%)", report.close, report.change_pct);
    println!("  MA trend:    {}", report.trend);
    println!("  RSI:         {} ({})", fmt_opt(report.rsi), report.rsi_zone);
    println!("  MACD:        {}", report.macd_bias);
    println!("  Volume:      {}", report.volume_trend);
    println!(
        "  Bollinger:   {} / {}",
        fmt_opt(report.bb_lower),
        fmt_opt(report.bb_upper)
    );
    println!("  Suggestion:  {}", report.suggestion);
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
