//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestResult};
use crate::domain::config_validation::{parse_date, validate_data_config, validate_strategy_config};
use crate::domain::error::EmatrailError;
use crate::domain::metrics::Metrics;
use crate::domain::strategy::{
    StrategyConfig, DEFAULT_FAST_SPAN, DEFAULT_FILTER_SPAN, DEFAULT_INITIAL_CAPITAL,
    DEFAULT_SLOW_SPAN, DEFAULT_STOP_PCT,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(
    name = "ematrail",
    about = "EMA crossover backtester with trend filter and trailing stop"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Write the per-bar result table as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn execute(cli: Cli) -> Result<(), EmatrailError> {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            data_dir,
            output,
            dry_run,
        } => {
            if dry_run {
                run_validate(&config)
            } else {
                run_backtest(
                    &config,
                    symbol.as_deref(),
                    data_dir.as_deref(),
                    output.as_deref(),
                )
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info {
            config,
            symbol,
            data_dir,
        } => run_info(config.as_deref(), symbol.as_deref(), data_dir.as_deref()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, EmatrailError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

/// Builds strategy parameters from `[strategy]` and `[backtest]`, defaults for absent keys.
///
/// Malformed or out-of-range values fail with `ConfigInvalid`.
pub fn build_strategy_config(adapter: &dyn ConfigPort) -> Result<StrategyConfig, EmatrailError> {
    validate_strategy_config(adapter)?;

    let span = |key: &str, default: usize| -> usize {
        let value = adapter.get_int("strategy", key, default as i64);
        usize::try_from(value).unwrap_or(0)
    };

    let config = StrategyConfig {
        fast_span: span("fast_span", DEFAULT_FAST_SPAN),
        slow_span: span("slow_span", DEFAULT_SLOW_SPAN),
        filter_span: span("filter_span", DEFAULT_FILTER_SPAN),
        stop_pct: adapter.get_double("strategy", "stop_pct", DEFAULT_STOP_PCT),
        initial_capital: adapter.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL),
    };
    config.validate()?;
    Ok(config)
}

pub fn resolve_symbol(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, EmatrailError> {
    symbol_override
        .map(str::to_string)
        .or_else(|| config.get_string("data", "symbol"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| EmatrailError::ConfigMissing {
            section: "data".into(),
            key: "symbol".into(),
        })
}

pub fn resolve_data_dir(dir_override: Option<&Path>, config: Option<&dyn ConfigPort>) -> PathBuf {
    dir_override
        .map(Path::to_path_buf)
        .or_else(|| config.and_then(|c| c.get_string("data", "directory")).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

fn run_validate(config_path: &Path) -> Result<(), EmatrailError> {
    let adapter = load_config(config_path)?;
    let strategy = build_strategy_config(&adapter)?;
    validate_data_config(&adapter)?;
    for section in adapter.unknown_sections() {
        warn!(section = %section, "unknown config section ignored");
    }

    println!("Strategy: {}", strategy.label());
    println!("Initial capital: {:.2}", strategy.initial_capital);
    match resolve_symbol(None, &adapter) {
        Ok(symbol) => println!("Symbol: {}", symbol),
        Err(_) => warn!("no [data] symbol configured; pass --symbol when running"),
    }
    println!("Configuration is valid");
    Ok(())
}

fn run_backtest(
    config_path: &Path,
    symbol_override: Option<&str>,
    dir_override: Option<&Path>,
    output_override: Option<&Path>,
) -> Result<(), EmatrailError> {
    let adapter = load_config(config_path)?;
    let strategy = build_strategy_config(&adapter)?;
    validate_data_config(&adapter)?;

    let symbol = resolve_symbol(symbol_override, &adapter)?;
    let data_dir = resolve_data_dir(dir_override, Some(&adapter));
    let start = parse_date(&adapter, "start_date")?;
    let end = parse_date(&adapter, "end_date")?;

    let output = output_override
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_string("report", "output").map(PathBuf::from));

    let data_port = CsvAdapter::new(data_dir);
    let (result, metrics) =
        run_backtest_pipeline(&data_port, &strategy, &symbol, start, end)?;

    print!("{}", format_summary(&result, &metrics));

    if let Some(path) = output {
        CsvReportAdapter.write(&result, &metrics, &path.to_string_lossy())?;
    }
    Ok(())
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy: &StrategyConfig,
    symbol: &str,
    start: Option<chrono::NaiveDate>,
    end: Option<chrono::NaiveDate>,
) -> Result<(BacktestResult, Metrics), EmatrailError> {
    let series = data_port.fetch_ohlcv(symbol, start, end)?;
    info!(
        symbol,
        bars = series.len(),
        from = %series.first_date(),
        to = %series.last_date(),
        "price series loaded"
    );

    let result = backtest_engine::run_backtest(&series, strategy)?;
    let metrics = Metrics::compute(&result);
    Ok((result, metrics))
}

pub fn format_summary(result: &BacktestResult, metrics: &Metrics) -> String {
    let mut out = String::new();
    out.push_str(&format!("Symbol: {}\n", result.symbol));
    if let (Some(start), Some(end)) = (result.start_date(), result.end_date()) {
        out.push_str(&format!("Backtest from {} to {}\n", start, end));
    }
    out.push_str(&format!(
        "Initial capital: {:.2}\n",
        result.config.initial_capital
    ));
    out.push_str(&format!("Strategy: {}\n", result.config.label()));
    out.push_str(&format!("Final value: {:.2}\n", metrics.final_value));
    out.push_str(&format!("Total return: {:.4}\n", metrics.total_return));
    out.push_str(&format!(
        "Annualized return: {:.2}%\n",
        metrics.annualized_return * 100.0
    ));
    out.push_str(&format!(
        "Max drawdown: -{:.1}% ({} bars)\n",
        metrics.max_drawdown * 100.0,
        metrics.max_drawdown_duration
    ));
    out.push_str(&format!("Exposure: {:.1}%\n", metrics.exposure * 100.0));
    out.push_str(&format!(
        "Trades: {} ({} stopped out), win rate {:.1}%\n",
        metrics.total_trades,
        metrics.stop_exits,
        metrics.win_rate * 100.0
    ));
    out
}

fn run_info(
    config_path: Option<&Path>,
    symbol_override: Option<&str>,
    dir_override: Option<&Path>,
) -> Result<(), EmatrailError> {
    let adapter = config_path.map(load_config).transpose()?;
    let config = adapter.as_ref().map(|a| a as &dyn ConfigPort);
    let data_port = CsvAdapter::new(resolve_data_dir(dir_override, config));

    let symbols = match (symbol_override, config) {
        (Some(s), _) => vec![s.to_string()],
        (None, Some(c)) => match c.get_string("data", "symbol") {
            Some(s) => vec![s],
            None => data_port.list_symbols()?,
        },
        (None, None) => data_port.list_symbols()?,
    };

    if symbols.is_empty() {
        warn!("no symbols found");
    }

    for symbol in &symbols {
        match data_port.get_data_range(symbol)? {
            Some((min, max, count)) => {
                println!("{}: {} to {} ({} bars)", symbol, min, max, count)
            }
            None => println!("{}: no data found", symbol),
        }
    }
    Ok(())
}
