//! CLI definition and dispatch.

use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{self, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::adapters::synthetic_adapter::SyntheticAdapter;
use crate::domain::backtest::{run_batch, BacktestConfig, BacktestJob};
use crate::domain::config_validation::{
    is_valid_pair, parse_pairs, validate_backtest_config, validate_strategy_config,
};
use crate::domain::error::BacktestError;
use crate::domain::indicator_helpers::{compute_indicators, IndicatorParams};
use crate::domain::metrics::{BacktestResult, BatchSummary};
use crate::domain::strategy::StrategyConfig;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "fxbacktest", about = "Forex strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest for every configured pair
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Run only this pair instead of `[backtest] pairs`
        #[arg(long)]
        pair: Option<String>,
        /// Write results as JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Compute every indicator over a candle CSV
    Indicators {
        #[arg(long)]
        candles: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write synthetic candles to CSV
    Generate {
        #[arg(long)]
        pair: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            pair,
            output,
        } => run_backtest(&config, pair.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Indicators { candles, output } => run_indicators(&candles, &output),
        Command::Generate {
            pair,
            start,
            end,
            output,
            seed,
        } => run_generate(&pair, start, end, &output, seed),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, BacktestError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// `--pair` if given, else `[backtest] pairs`.
pub fn resolve_pairs(pair_override: Option<&str>, config: &dyn ConfigPort) -> Vec<String> {
    match pair_override {
        Some(p) => parse_pairs(p),
        None => config
            .get_string("backtest", "pairs")
            .map(|s| parse_pairs(&s))
            .unwrap_or_default(),
    }
}

pub fn seed(config: &dyn ConfigPort) -> u64 {
    config.get_int("backtest", "seed", 42).max(0) as u64
}

/// CSV files when `[backtest] data_dir` is set, synthetic candles otherwise.
pub fn data_port_from_config(config: &dyn ConfigPort) -> Box<dyn DataPort> {
    match config.get_string("backtest", "data_dir") {
        Some(dir) if !dir.trim().is_empty() => {
            Box::new(CsvAdapter::new(PathBuf::from(dir.trim())))
        }
        _ => {
            let minutes = config.get_int("backtest", "interval_minutes", 60);
            Box::new(SyntheticAdapter::with_interval(
                seed(config),
                Duration::minutes(minutes),
            ))
        }
    }
}

fn run_backtest(
    config_path: &Path,
    pair_override: Option<&str>,
    output_path: Option<&Path>,
) -> Result<(), BacktestError> {
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    validate_strategy_config(&adapter)?;

    let pairs = resolve_pairs(pair_override, &adapter);
    if let Some(bad) = pairs.iter().find(|p| !is_valid_pair(p)) {
        return Err(BacktestError::invalid_parameter(
            "pair",
            format!("{bad} is not a BASE/QUOTE pair"),
        ));
    }

    let data_port = data_port_from_config(&adapter);
    let results = run_backtest_pipeline(data_port.as_ref(), &adapter, &pairs)?;
    print_summary(&results);

    let report = JsonReportAdapter::new();
    match output_path {
        Some(path) => {
            report.write(&results, path)?;
            eprintln!("\nResults written to: {}", path.display());
        }
        None => println!("{}", report.render(&results)?),
    }
    Ok(())
}

/// Fetch each pair's candles and run them as one parallel batch.
///
/// Pairs whose data cannot be fetched are skipped with a warning; it is an
/// error only when none are left. The configured capital is split equally
/// across the pairs that loaded.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    pairs: &[String],
) -> Result<Vec<BacktestResult>, BacktestError> {
    let strategy = StrategyConfig::from_config(config)?;
    eprintln!("Strategy: {}", strategy.strategy.name());

    let mut jobs = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let bt_config = BacktestConfig::from_config(config, pair)?;
        let candles =
            match data_port.fetch_candles(pair, bt_config.start_date, bt_config.end_date) {
                Ok(candles) => candles,
                Err(e) => {
                    eprintln!("warning: skipping {} ({})", pair, e);
                    continue;
                }
            };
        eprintln!("  {}: {} candles", pair, candles.len());
        jobs.push(BacktestJob {
            config: bt_config,
            strategy,
            candles,
        });
    }

    if jobs.is_empty() {
        return Err(BacktestError::NoData {
            pair: pairs.join(", "),
        });
    }

    let share = jobs[0].config.initial_capital / jobs.len() as f64;
    for job in &mut jobs {
        job.config.initial_capital = share;
    }

    eprintln!("Running backtest: {} pairs, {:.2} each", jobs.len(), share);
    Ok(run_batch(&jobs, seed(config)))
}

fn print_summary(results: &[BacktestResult]) {
    for r in results {
        eprintln!("\n=== {} ({}) ===", r.pair, r.strategy);
        eprintln!("Period:           {} to {}", r.start_date, r.end_date);
        eprintln!("Final Capital:    {:.2}", r.final_capital);
        eprintln!("Total Return:     {:.2}%", r.total_return_percent);
        eprintln!("Sharpe Ratio:     {:.2}", r.sharpe_ratio);
        eprintln!("Max Drawdown:     -{:.2}%", r.max_drawdown_percent);
        eprintln!("Total Trades:     {}", r.total_trades);
        eprintln!("Win Rate:         {:.1}%", r.win_rate * 100.0);
        eprintln!("Profit Factor:    {:.2}", r.profit_factor);
    }

    if results.len() > 1 {
        let summary = BatchSummary::from_results(results);
        eprintln!("\n=== Portfolio ({} pairs) ===", summary.pairs.len());
        eprintln!("Initial Capital:  {:.2}", summary.initial_capital);
        eprintln!("Final Capital:    {:.2}", summary.final_capital);
        eprintln!("Total Return:     {:.2}%", summary.total_return_percent);
        eprintln!("Total Trades:     {}", summary.total_trades);
        eprintln!("Winning Trades:   {}", summary.winning_trades);
        eprintln!("Win Rate:         {:.1}%", summary.win_rate * 100.0);
    }
}

fn run_validate(config_path: &Path) -> Result<(), BacktestError> {
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    validate_strategy_config(&adapter)?;

    let strategy = StrategyConfig::from_config(&adapter)?;
    let pairs = resolve_pairs(None, &adapter);
    eprintln!("\nStrategy: {}", strategy.strategy.name());
    eprintln!("  {:?}", strategy.strategy);
    eprintln!("Risk:");
    eprintln!("  max_position_size: {}", strategy.risk.max_position_fraction);
    eprintln!("  stop_loss_pct:     {:?}", strategy.risk.stop_loss_pct);
    eprintln!("  take_profit_pct:   {:?}", strategy.risk.take_profit_pct);
    eprintln!("  max_holding_hours: {}", strategy.risk.max_holding.num_hours());
    eprintln!("Pairs: {}", pairs.join(", "));
    eprintln!("\nConfiguration is valid");
    Ok(())
}

fn run_indicators(candles_path: &Path, output_path: &Path) -> Result<(), BacktestError> {
    let candles = csv_adapter::read_candles(candles_path)?;
    let indicators = compute_indicators(&candles, &IndicatorParams::default());
    csv_adapter::write_indicator_table(output_path, &candles, &indicators)?;
    eprintln!(
        "{} indicators over {} candles written to {}",
        indicators.names().count(),
        candles.len(),
        output_path.display()
    );
    Ok(())
}

fn run_generate(
    pair: &str,
    start: NaiveDate,
    end: NaiveDate,
    output_path: &Path,
    seed: u64,
) -> Result<(), BacktestError> {
    let pair = pair.trim().to_uppercase();
    if !is_valid_pair(&pair) {
        return Err(BacktestError::invalid_parameter(
            "pair",
            format!("{pair} is not a BASE/QUOTE pair"),
        ));
    }
    if end <= start {
        return Err(BacktestError::invalid_parameter(
            "end",
            "must be after start",
        ));
    }

    let candles = SyntheticAdapter::new(seed).fetch_candles(&pair, start, end)?;
    csv_adapter::write_candles(output_path, &candles)?;
    eprintln!(
        "{} candles for {} written to {}",
        candles.len(),
        pair,
        output_path.display()
    );
    Ok(())
}
