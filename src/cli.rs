//! CLI definition and dispatch.

use chrono::{DateTime, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvCandleProvider;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::indicator_adapter::StandardIndicatorEngine;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::config_validation::{
    parse_config_date, validate_backtest_config, validate_strategy_config,
};
use crate::domain::engine::{BacktestConfig, BacktestEngine, BacktestRun};
use crate::domain::error::TradesimError;
use crate::domain::metrics::Metrics;
use crate::domain::rule_parser;
use crate::domain::signal::DeterministicDemoEntrySignal;
use crate::domain::strategy::{StopRule, Strategy, ThresholdKind};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::CandleProvider;
use crate::ports::indicator_port::IndicatorEngine;
use crate::ports::report_port::{BacktestReport, ReportPort};

#[derive(Parser, Debug)]
#[command(name = "tradesim", about = "Rule-driven OHLCV backtest engine")]
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
        /// Directory holding {SYMBOL}_{TIMEFRAME}.csv candle files
        #[arg(short, long)]
        data: PathBuf,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        timeframe: Option<String>,
        /// Use the deterministic demo entry signal instead of the strategy rules
        #[arg(long)]
        demo_entry: bool,
    },
    /// Validate a config file, including rule syntax
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in a data directory
    ListSymbols {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        timeframe: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            output,
            symbol,
            timeframe,
            demo_entry,
        } => run_backtest(
            &config,
            &data,
            output.as_ref(),
            symbol.as_deref(),
            timeframe.as_deref(),
            demo_entry,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { data, timeframe } => run_list_symbols(&data, &timeframe),
    }
}

/// The symbol/timeframe/date-range a run covers.
#[derive(Debug, Clone, PartialEq)]
pub struct RunWindow {
    pub symbol: String,
    pub timeframe: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, TradesimError> {
    FileConfigAdapter::from_file(path).map_err(|e| TradesimError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_backtest_config(
    adapter: &dyn ConfigPort,
) -> Result<(BacktestConfig, RunWindow), TradesimError> {
    let missing = |key: &str| TradesimError::ConfigMissing {
        section: "backtest".into(),
        key: key.into(),
    };
    let invalid_date = |key: &str| TradesimError::ConfigInvalid {
        section: "backtest".into(),
        key: key.into(),
        reason: "invalid date format (expected YYYY-MM-DD)".into(),
    };

    let symbol = adapter
        .get_string("backtest", "symbol")
        .ok_or_else(|| missing("symbol"))?;
    let timeframe = adapter
        .get_string("backtest", "timeframe")
        .ok_or_else(|| missing("timeframe"))?;

    let start_str = adapter
        .get_string("backtest", "start_date")
        .ok_or_else(|| missing("start_date"))?;
    let start_date = parse_config_date(&start_str).ok_or_else(|| invalid_date("start_date"))?;
    let end_str = adapter
        .get_string("backtest", "end_date")
        .ok_or_else(|| missing("end_date"))?;
    let end_date = parse_config_date(&end_str).ok_or_else(|| invalid_date("end_date"))?;

    let window = RunWindow {
        symbol,
        timeframe,
        start: start_date.and_time(NaiveTime::MIN).and_utc(),
        end: end_date.and_time(NaiveTime::MIN).and_utc() + chrono::Duration::days(1)
            - chrono::Duration::seconds(1),
    };

    let config = BacktestConfig {
        initial_capital: adapter.get_double("backtest", "initial_capital", 10_000.0),
        commission: adapter.get_double("backtest", "commission", 4.0),
        slippage_pct: adapter.get_double("backtest", "slippage_pct", 0.5),
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", 0.02),
    };

    Ok((config, window))
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<Strategy, TradesimError> {
    let name = adapter
        .get_string("strategy", "name")
        .unwrap_or_else(|| "Unnamed".to_string());

    let entry_str = adapter
        .get_string("strategy", "entry_rules")
        .unwrap_or_default();
    let entry_rules = rule_parser::parse_entry_rules(&entry_str)?;

    let exit_str = adapter
        .get_string("strategy", "exit_rules")
        .unwrap_or_default();
    let exit_rules = rule_parser::parse_exit_rules(&exit_str)?;

    let stop_loss = build_stop(adapter, "stop_loss_type", "stop_loss_value")?;
    let take_profit = build_stop(adapter, "take_profit_type", "take_profit_value")?;

    let max_hold = adapter.get_int("strategy", "max_hold_bars", 0);
    let max_hold_bars = if max_hold > 0 {
        Some(max_hold as usize)
    } else {
        None
    };

    Ok(Strategy {
        name,
        entry_rules,
        exit_rules,
        stop_loss,
        take_profit,
        max_hold_bars,
    })
}

fn build_stop(
    adapter: &dyn ConfigPort,
    type_key: &str,
    value_key: &str,
) -> Result<Option<StopRule>, TradesimError> {
    let Some(kind_str) = adapter
        .get_string("strategy", type_key)
        .filter(|s| !s.trim().is_empty())
    else {
        return Ok(None);
    };

    let kind = ThresholdKind::parse(&kind_str).ok_or_else(|| TradesimError::ConfigInvalid {
        section: "strategy".into(),
        key: type_key.into(),
        reason: format!(
            "unknown type '{}' (expected percentage, points, ticks, or atr)",
            kind_str
        ),
    })?;

    Ok(Some(StopRule {
        kind,
        value: adapter.get_double("strategy", value_key, 0.0),
    }))
}

/// Fetch, enrich, simulate, measure. Capabilities come in as ports; no
/// ambient state.
pub fn run_backtest_pipeline(
    provider: &dyn CandleProvider,
    indicators: &dyn IndicatorEngine,
    strategy: &Strategy,
    bt_config: &BacktestConfig,
    window: &RunWindow,
    demo_entry: bool,
) -> Result<(BacktestRun, Metrics), TradesimError> {
    let candles = provider.fetch_candles(
        &window.symbol,
        &window.timeframe,
        window.start,
        window.end,
    )?;
    if candles.is_empty() {
        return Err(TradesimError::NoData {
            symbol: window.symbol.clone(),
            timeframe: window.timeframe.clone(),
        });
    }

    let rows = indicators.enrich(&candles)?;
    let engine = BacktestEngine::new(bt_config.clone())?;

    log::info!(
        "running backtest: {} {} bars, {} to {}",
        window.symbol,
        rows.len(),
        window.start,
        window.end,
    );

    let run = if demo_entry {
        engine.run_with_entry(&rows, strategy, &DeterministicDemoEntrySignal)?
    } else {
        engine.run(&rows, strategy)?
    };

    let metrics = Metrics::compute(
        &run.trades,
        bt_config.initial_capital,
        window.start,
        window.end,
        bt_config.risk_free_rate,
    );

    Ok((run, metrics))
}

fn run_backtest(
    config_path: &PathBuf,
    data_path: &PathBuf,
    output_path: Option<&PathBuf>,
    symbol_override: Option<&str>,
    timeframe_override: Option<&str>,
    demo_entry: bool,
) -> ExitCode {
    log::info!("loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(&e);
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(&e);
    }

    let (bt_config, mut window) = match build_backtest_config(&adapter) {
        Ok(pair) => pair,
        Err(e) => return fail(&e),
    };
    if let Some(symbol) = symbol_override {
        window.symbol = symbol.to_uppercase();
    }
    if let Some(timeframe) = timeframe_override {
        window.timeframe = timeframe.to_string();
    }

    let strategy = match build_strategy(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    log::info!("strategy: {}", strategy.name);
    if demo_entry {
        log::warn!("using the deterministic demo entry signal; results carry no market meaning");
    }

    let provider = CsvCandleProvider::new(data_path.clone());
    let indicators = StandardIndicatorEngine;

    let (run, metrics) = match run_backtest_pipeline(
        &provider,
        &indicators,
        &strategy,
        &bt_config,
        &window,
        demo_entry,
    ) {
        Ok(pair) => pair,
        Err(e) => return fail(&e),
    };

    print_summary(&window, &run, &metrics);

    let report = BacktestReport {
        strategy: &strategy.name,
        symbol: &window.symbol,
        timeframe: &window.timeframe,
        start: window.start,
        end: window.end,
        initial_capital: bt_config.initial_capital,
        final_value: run.final_value,
        max_drawdown: run.max_drawdown,
        trades: &run.trades,
        metrics: &metrics,
    };

    let json = match JsonReportAdapter.render(&report) {
        Ok(j) => j,
        Err(e) => return fail(&e),
    };

    match output_path {
        Some(path) => match fs::write(path, &json) {
            Ok(()) => {
                eprintln!("\nReport written to: {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: failed to write report: {e}");
                ExitCode::from(1)
            }
        },
        None => {
            println!("{json}");
            ExitCode::SUCCESS
        }
    }
}

fn print_summary(window: &RunWindow, run: &BacktestRun, metrics: &Metrics) {
    eprintln!("\n=== Results: {} ({}) ===", window.symbol, window.timeframe);
    eprintln!("Total Trades:     {}", metrics.total_trades);
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate);
    eprintln!("Total Return:     {:.2} ({:.2}%)", metrics.total_return, metrics.total_return_percent);
    eprintln!("Profit Factor:    {:.2}", metrics.profit_factor);
    eprintln!("Sharpe Ratio:     {}", fmt_ratio(metrics.sharpe_ratio));
    eprintln!("Sortino Ratio:    {}", fmt_ratio(metrics.sortino_ratio));
    eprintln!("Max Drawdown:     {:.2}%", metrics.max_drawdown_percent);
    eprintln!("Expectancy:       {:.2}", metrics.expectancy);
    eprintln!("Final Value:      {:.2}", run.final_value);
    eprintln!("Rating:           {}", metrics.rating.label);
}

fn fmt_ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(&e);
    }

    let entry_str = adapter
        .get_string("strategy", "entry_rules")
        .unwrap_or_default();
    match rule_parser::parse_entry_rules(&entry_str) {
        Ok(rules) => {
            eprintln!("\nEntry rules:");
            for rule in &rules {
                eprintln!("  {}", rule);
            }
        }
        Err(e) => {
            eprintln!("error: failed to parse entry_rules:\n{}", e.display_with_context(&entry_str));
            return (&TradesimError::from(e)).into();
        }
    }

    let exit_str = adapter
        .get_string("strategy", "exit_rules")
        .unwrap_or_default();
    match rule_parser::parse_exit_rules(&exit_str) {
        Ok(rules) => {
            if !rules.is_empty() {
                eprintln!("\nExit rules:");
                for rule in &rules {
                    eprintln!("  {}", rule);
                }
            }
        }
        Err(e) => {
            eprintln!("error: failed to parse exit_rules:\n{}", e.display_with_context(&exit_str));
            return (&TradesimError::from(e)).into();
        }
    }

    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(&e);
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(data_path: &PathBuf, timeframe: &str) -> ExitCode {
    let provider = CsvCandleProvider::new(data_path.clone());
    match provider.list_symbols(timeframe) {
        Ok(symbols) => {
            if symbols.is_empty() {
                eprintln!("No symbols found for timeframe {}", timeframe);
            } else {
                for symbol in &symbols {
                    println!("{}", symbol);
                }
                eprintln!("{} symbols found", symbols.len());
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn fail(err: &TradesimError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}
