//! Strategy catalogue and signal generation.
//!
//! A [`Strategy`] is one of a closed set of rule sets, each carrying its own
//! validated parameters. [`RiskParams`] hold the sizing and exit limits the
//! simulation applies to every position the strategy opens.

use chrono::Duration;

use crate::domain::error::BacktestError;
use crate::domain::indicator::{bollinger, calculate_macd, calculate_rsi, calculate_sma, macd};
use crate::domain::ohlcv::{closes, Candle};
use crate::domain::signal::{
    bollinger_touches, macd_crossover, rsi_levels, sma_crossover, Direction, Signal, SignalSeries,
};
use crate::ports::config_port::ConfigPort;

/// Below this many candles no strategy emits signals.
pub const MIN_SIGNAL_CANDLES: usize = 50;

const STRATEGY_SECTION: &str = "strategy";
const RISK_SECTION: &str = "risk";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmaCrossoverParams {
    pub fast: usize,
    pub slow: usize,
}

impl Default for SmaCrossoverParams {
    fn default() -> Self {
        SmaCrossoverParams { fast: 10, slow: 30 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiParams {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        RsiParams {
            period: 14,
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerParams {
    pub period: usize,
    pub std_dev: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        BollingerParams {
            period: bollinger::DEFAULT_PERIOD,
            std_dev: bollinger::DEFAULT_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        MacdParams {
            fast: macd::DEFAULT_FAST,
            slow: macd::DEFAULT_SLOW,
            signal: macd::DEFAULT_SIGNAL,
        }
    }
}

/// Consensus of SMA trend, RSI extremes and MACD trend.
///
/// Only the most recent `lookback` candles vote, and never the first `warmup`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiIndicatorParams {
    pub sma: SmaCrossoverParams,
    pub rsi: RsiParams,
    pub macd: MacdParams,
    pub warmup: usize,
    pub lookback: usize,
}

impl Default for MultiIndicatorParams {
    fn default() -> Self {
        MultiIndicatorParams {
            sma: SmaCrossoverParams::default(),
            rsi: RsiParams::default(),
            macd: MacdParams::default(),
            warmup: 30,
            lookback: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    SmaCrossover(SmaCrossoverParams),
    RsiMeanReversion(RsiParams),
    BollingerBands(BollingerParams),
    Macd(MacdParams),
    MultiIndicator(MultiIndicatorParams),
}

/// Sizing and exit limits applied to every position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskParams {
    /// Fraction of capital committed per position before strength scaling.
    pub max_position_fraction: f64,
    pub stop_loss_pct: Option<f64>,
    pub take_profit_pct: Option<f64>,
    pub max_holding: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyConfig {
    pub strategy: Strategy,
    pub risk: RiskParams,
}

impl Strategy {
    pub const NAMES: [&'static str; 5] = [
        "sma_crossover",
        "rsi_mean_reversion",
        "bollinger_bands",
        "macd",
        "multi_indicator",
    ];

    /// Build a strategy from its name and the `[strategy]` section.
    ///
    /// Missing keys take the defaults; present keys are validated. An unknown
    /// name falls back to `sma_crossover` with default parameters.
    pub fn from_name(name: &str, config: &dyn ConfigPort) -> Result<Self, BacktestError> {
        let strategy = match name.trim() {
            "sma_crossover" => Strategy::SmaCrossover(read_sma(config)?),
            "rsi_mean_reversion" => Strategy::RsiMeanReversion(read_rsi(config)?),
            "bollinger_bands" => Strategy::BollingerBands(read_bollinger(config)?),
            "macd" => Strategy::Macd(read_macd(config)?),
            "multi_indicator" => Strategy::MultiIndicator(MultiIndicatorParams {
                sma: read_sma(config)?,
                rsi: read_rsi(config)?,
                macd: read_macd(config)?,
                warmup: read_count(config, "warmup", 30, 0)?,
                lookback: read_count(config, "lookback", 100, 1)?,
            }),
            other => {
                tracing::warn!(strategy = other, "unknown strategy, using sma_crossover");
                Strategy::SmaCrossover(SmaCrossoverParams::default())
            }
        };
        Ok(strategy)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::SmaCrossover(_) => "sma_crossover",
            Strategy::RsiMeanReversion(_) => "rsi_mean_reversion",
            Strategy::BollingerBands(_) => "bollinger_bands",
            Strategy::Macd(_) => "macd",
            Strategy::MultiIndicator(_) => "multi_indicator",
        }
    }

    /// Fixed strength of every emitted signal. For `multi_indicator` this is
    /// the cap on the agreeing-vote fraction.
    pub fn strength(&self) -> f64 {
        match self {
            Strategy::SmaCrossover(_) => 0.7,
            Strategy::RsiMeanReversion(_) => 0.6,
            Strategy::BollingerBands(_) => 0.65,
            Strategy::Macd(_) => 0.7,
            Strategy::MultiIndicator(_) => 0.9,
        }
    }

    pub fn default_risk(&self) -> RiskParams {
        let (stop_loss, take_profit) = match self {
            Strategy::RsiMeanReversion(_) => (0.015, 0.03),
            Strategy::Macd(_) => (0.025, 0.05),
            _ => (0.02, 0.04),
        };
        RiskParams {
            max_position_fraction: 0.1,
            stop_loss_pct: Some(stop_loss),
            take_profit_pct: Some(take_profit),
            max_holding: Duration::hours(168),
        }
    }

    /// Signals in candle order. Empty below [`MIN_SIGNAL_CANDLES`].
    pub fn generate_signals(&self, candles: &[Candle]) -> Vec<Signal> {
        if candles.len() < MIN_SIGNAL_CANDLES {
            return Vec::new();
        }
        let prices = closes(candles);

        let series = match self {
            Strategy::SmaCrossover(p) => sma_crossover(&prices, p.fast, p.slow),
            Strategy::RsiMeanReversion(p) => {
                rsi_levels(&prices, p.period, p.overbought, p.oversold)
            }
            Strategy::BollingerBands(p) => bollinger_touches(&prices, p.period, p.std_dev),
            Strategy::Macd(p) => macd_crossover(&prices, p.fast, p.slow, p.signal),
            Strategy::MultiIndicator(p) => return self.vote(candles, &prices, p),
        };
        self.materialize(candles, &series)
    }

    fn materialize(&self, candles: &[Candle], series: &SignalSeries) -> Vec<Signal> {
        candles
            .iter()
            .zip(series)
            .filter_map(|(candle, direction)| {
                direction.map(|direction| Signal {
                    timestamp: candle.timestamp,
                    direction,
                    strength: self.strength(),
                    source: self.name(),
                })
            })
            .collect()
    }

    fn vote(&self, candles: &[Candle], prices: &[f64], p: &MultiIndicatorParams) -> Vec<Signal> {
        let fast = calculate_sma(prices, p.sma.fast);
        let slow = calculate_sma(prices, p.sma.slow);
        let rsi = calculate_rsi(prices, p.rsi.period);
        let macd = calculate_macd(prices, p.macd.fast, p.macd.slow, p.macd.signal);

        let start = p.warmup.max(candles.len().saturating_sub(p.lookback));
        let mut signals = Vec::new();

        for i in start..candles.len() {
            let mut votes: Vec<i8> = Vec::with_capacity(3);
            if let Some(v) = trend_vote(fast[i], slow[i]) {
                votes.push(v);
            }
            if let Some(r) = rsi[i] {
                if r < p.rsi.oversold {
                    votes.push(1);
                } else if r > p.rsi.overbought {
                    votes.push(-1);
                }
            }
            if let Some(v) = trend_vote(macd.line[i], macd.signal[i]) {
                votes.push(v);
            }

            let Some((direction, strength)) = tally(&votes, self.strength()) else {
                continue;
            };
            signals.push(Signal {
                timestamp: candles[i].timestamp,
                direction,
                strength,
                source: self.name(),
            });
        }
        signals
    }
}

/// +1 when `a` is above `b`, else -1. Undefined abstains.
fn trend_vote(a: Option<f64>, b: Option<f64>) -> Option<i8> {
    let (a, b) = (a?, b?);
    Some(if a > b { 1 } else { -1 })
}

/// Consensus of the cast votes: at least two, summing to +2 or more (buy)
/// or -2 or less (sell). Strength is the agreeing fraction, capped at `cap`.
fn tally(votes: &[i8], cap: f64) -> Option<(Direction, f64)> {
    if votes.len() < 2 {
        return None;
    }
    let total: i32 = votes.iter().map(|&v| i32::from(v)).sum();
    let direction = match total {
        t if t >= 2 => Direction::Buy,
        t if t <= -2 => Direction::Sell,
        _ => return None,
    };
    let agreeing = votes
        .iter()
        .filter(|&&v| (v > 0) == (direction == Direction::Buy))
        .count();
    Some((direction, (agreeing as f64 / votes.len() as f64).min(cap)))
}

impl RiskParams {
    /// Overlay the `[risk]` section on `defaults`. A percentage of 0 disables
    /// that exit.
    pub fn from_config(config: &dyn ConfigPort, defaults: RiskParams) -> Result<Self, BacktestError> {
        let max_position_fraction =
            config.get_double(RISK_SECTION, "max_position_size", defaults.max_position_fraction);
        if !(max_position_fraction > 0.0 && max_position_fraction <= 1.0) {
            return Err(BacktestError::invalid_parameter(
                "max_position_size",
                "must be in (0, 1]",
            ));
        }

        let stop_loss_pct = read_exit_pct(config, "stop_loss_pct", defaults.stop_loss_pct)?;
        let take_profit_pct = read_exit_pct(config, "take_profit_pct", defaults.take_profit_pct)?;
        if matches!(stop_loss_pct, Some(pct) if pct >= 1.0) {
            return Err(BacktestError::invalid_parameter(
                "stop_loss_pct",
                "must be below 1",
            ));
        }

        let hours = config.get_int(
            RISK_SECTION,
            "max_holding_hours",
            defaults.max_holding.num_hours(),
        );
        if hours < 1 {
            return Err(BacktestError::invalid_parameter(
                "max_holding_hours",
                "must be at least 1",
            ));
        }

        Ok(RiskParams {
            max_position_fraction,
            stop_loss_pct,
            take_profit_pct,
            max_holding: Duration::hours(hours),
        })
    }
}

impl StrategyConfig {
    /// A strategy with its own default risk limits.
    pub fn new(strategy: Strategy) -> Self {
        StrategyConfig {
            strategy,
            risk: strategy.default_risk(),
        }
    }

    /// Read `[strategy] name` and parameters, then the `[risk]` overrides.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BacktestError> {
        let name = config
            .get_string(STRATEGY_SECTION, "name")
            .unwrap_or_else(|| "sma_crossover".to_string());
        let strategy = Strategy::from_name(&name, config)?;
        let risk = RiskParams::from_config(config, strategy.default_risk())?;
        Ok(StrategyConfig { strategy, risk })
    }
}

fn read_count(
    config: &dyn ConfigPort,
    key: &str,
    default: usize,
    min: i64,
) -> Result<usize, BacktestError> {
    let value = config.get_int(STRATEGY_SECTION, key, default as i64);
    if value < min {
        return Err(BacktestError::invalid_parameter(
            key,
            format!("must be at least {min}"),
        ));
    }
    Ok(value as usize)
}

fn read_period(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, BacktestError> {
    read_count(config, key, default, 1)
}

fn read_sma(config: &dyn ConfigPort) -> Result<SmaCrossoverParams, BacktestError> {
    let defaults = SmaCrossoverParams::default();
    let fast = read_period(config, "sma_fast", defaults.fast)?;
    let slow = read_period(config, "sma_slow", defaults.slow)?;
    if fast >= slow {
        return Err(BacktestError::invalid_parameter(
            "sma_fast",
            "must be shorter than sma_slow",
        ));
    }
    Ok(SmaCrossoverParams { fast, slow })
}

fn read_rsi(config: &dyn ConfigPort) -> Result<RsiParams, BacktestError> {
    let defaults = RsiParams::default();
    let period = read_period(config, "rsi_period", defaults.period)?;
    let overbought = config.get_double(STRATEGY_SECTION, "rsi_overbought", defaults.overbought);
    let oversold = config.get_double(STRATEGY_SECTION, "rsi_oversold", defaults.oversold);
    if !(0.0..=100.0).contains(&overbought) || !(0.0..=100.0).contains(&oversold) {
        return Err(BacktestError::invalid_parameter(
            "rsi_overbought",
            "RSI levels must be within [0, 100]",
        ));
    }
    if oversold >= overbought {
        return Err(BacktestError::invalid_parameter(
            "rsi_oversold",
            "must be below rsi_overbought",
        ));
    }
    Ok(RsiParams {
        period,
        overbought,
        oversold,
    })
}

fn read_bollinger(config: &dyn ConfigPort) -> Result<BollingerParams, BacktestError> {
    let defaults = BollingerParams::default();
    let period = read_period(config, "bb_period", defaults.period)?;
    let std_dev = config.get_double(STRATEGY_SECTION, "bb_std_dev", defaults.std_dev);
    if std_dev <= 0.0 {
        return Err(BacktestError::invalid_parameter(
            "bb_std_dev",
            "must be positive",
        ));
    }
    Ok(BollingerParams { period, std_dev })
}

fn read_macd(config: &dyn ConfigPort) -> Result<MacdParams, BacktestError> {
    let defaults = MacdParams::default();
    let fast = read_period(config, "macd_fast", defaults.fast)?;
    let slow = read_period(config, "macd_slow", defaults.slow)?;
    let signal = read_period(config, "macd_signal", defaults.signal)?;
    if fast >= slow {
        return Err(BacktestError::invalid_parameter(
            "macd_fast",
            "must be shorter than macd_slow",
        ));
    }
    Ok(MacdParams { fast, slow, signal })
}

fn read_exit_pct(
    config: &dyn ConfigPort,
    key: &str,
    default: Option<f64>,
) -> Result<Option<f64>, BacktestError> {
    let value = config.get_double(RISK_SECTION, key, default.unwrap_or(0.0));
    if value < 0.0 {
        return Err(BacktestError::invalid_parameter(key, "must be non-negative"));
    }
    Ok((value > 0.0).then_some(value))
}
