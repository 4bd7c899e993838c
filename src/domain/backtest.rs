//! Simulation loop and batch runner.
//!
//! One run walks the candles once. For every candle, in order:
//! 1. a new calendar day records the previous day's return,
//! 2. peak capital and max drawdown are updated,
//! 3. open positions are checked for exits at the close,
//! 4. pending signals up to the candle's timestamp are turned into entries.
//!
//! Whatever is still open after the last candle is closed at its close.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::domain::error::BacktestError;
use crate::domain::execution::{CostModel, RandomSlippage, SlippageSource};
use crate::domain::metrics::BacktestResult;
use crate::domain::ohlcv::Candle;
use crate::domain::portfolio::RunState;
use crate::domain::position::{ExitReason, Position};
use crate::domain::signal::Signal;
use crate::domain::strategy::{RiskParams, StrategyConfig};
use crate::ports::config_port::ConfigPort;

/// Fewer candles than this produce an empty result.
pub const MIN_CANDLES: usize = 50;

/// An entry's notional may not exceed this share of current capital.
pub const MAX_NOTIONAL_FRACTION: f64 = 0.95;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub pair: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub costs: CostModel,
}

impl BacktestConfig {
    pub fn new(pair: &str, start_date: NaiveDate, end_date: NaiveDate, initial_capital: f64) -> Self {
        BacktestConfig {
            pair: pair.to_string(),
            start_date,
            end_date,
            initial_capital,
            costs: CostModel::default(),
        }
    }

    /// Read `[backtest]` dates and capital plus `[costs]` for one pair.
    pub fn from_config(config: &dyn ConfigPort, pair: &str) -> Result<Self, BacktestError> {
        let start_date = read_date(config, "start_date")?;
        let end_date = read_date(config, "end_date")?;
        // Missing or unparseable capital reads as 0 and fails validation.
        let initial_capital = config.get_double("backtest", "initial_capital", 0.0);

        let defaults = CostModel::default();
        let costs = CostModel {
            commission_rate: config.get_double("costs", "commission_rate", defaults.commission_rate),
            spread_rate: config.get_double("costs", "spread_cost", defaults.spread_rate),
            slippage_rate: config.get_double("costs", "slippage_factor", defaults.slippage_rate),
        };

        let backtest = BacktestConfig {
            pair: pair.to_string(),
            start_date,
            end_date,
            initial_capital,
            costs,
        };
        backtest.validate()?;
        Ok(backtest)
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        if !(self.initial_capital > 0.0 && self.initial_capital.is_finite()) {
            return Err(BacktestError::invalid_parameter(
                "initial_capital",
                "must be positive",
            ));
        }
        if self.end_date <= self.start_date {
            return Err(BacktestError::invalid_parameter(
                "end_date",
                "must be after start_date",
            ));
        }
        let rates = [
            ("commission_rate", self.costs.commission_rate),
            ("spread_cost", self.costs.spread_rate),
            ("slippage_factor", self.costs.slippage_rate),
        ];
        for (name, rate) in rates {
            if !(0.0..1.0).contains(&rate) {
                return Err(BacktestError::invalid_parameter(name, "must be in [0, 1)"));
            }
        }
        Ok(())
    }
}

fn read_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, BacktestError> {
    let value = config
        .get_string("backtest", key)
        .ok_or_else(|| BacktestError::ConfigMissing {
            section: "backtest".to_string(),
            key: key.to_string(),
        })?;
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| BacktestError::ConfigInvalid {
        section: "backtest".to_string(),
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Run one strategy over one pair's candles.
///
/// `config` is assumed validated (see [`BacktestConfig::validate`]); the
/// candles must be time-ordered.
pub fn run_backtest(
    candles: &[Candle],
    strategy: &StrategyConfig,
    config: &BacktestConfig,
    slippage: &mut dyn SlippageSource,
) -> BacktestResult {
    let name = strategy.strategy.name();
    if candles.len() < MIN_CANDLES {
        tracing::warn!(
            pair = %config.pair,
            candles = candles.len(),
            "insufficient data for backtest"
        );
        return BacktestResult::empty(config, name);
    }

    tracing::info!(
        pair = %config.pair,
        strategy = name,
        candles = candles.len(),
        "starting backtest"
    );

    let signals = strategy.strategy.generate_signals(candles);
    let state = simulate(candles, &signals, &strategy.risk, config, slippage);
    let result = BacktestResult::from_run(config, name, state);

    tracing::info!(
        pair = %config.pair,
        return_percent = format_args!("{:.2}", result.total_return_percent),
        trades = result.total_trades,
        "backtest completed"
    );
    result
}

/// Replay `signals` against `candles` and return the final run state.
pub fn simulate(
    candles: &[Candle],
    signals: &[Signal],
    risk: &RiskParams,
    config: &BacktestConfig,
    slippage: &mut dyn SlippageSource,
) -> RunState {
    let mut state = RunState::new(config.initial_capital);
    let mut pending = signals.iter().peekable();

    for candle in candles {
        state.roll_day(candle.day());
        state.update_drawdown();
        process_exits(&mut state, candle, &config.costs, slippage);

        while let Some(signal) = pending.next_if(|s| s.timestamp <= candle.timestamp) {
            try_open(&mut state, signal, candle, risk, config, slippage);
        }
    }

    if let Some(last) = candles.last() {
        while state.has_open_positions() {
            close_at(&mut state, 0, last, ExitReason::RunEnd, &config.costs, slippage);
        }
    }
    state
}

fn process_exits(
    state: &mut RunState,
    candle: &Candle,
    costs: &CostModel,
    slippage: &mut dyn SlippageSource,
) {
    let mut i = 0;
    while i < state.positions.len() {
        match state.positions[i].exit_reason(candle.close, candle.timestamp) {
            Some(reason) => close_at(state, i, candle, reason, costs, slippage),
            None => i += 1,
        }
    }
}

fn close_at(
    state: &mut RunState,
    index: usize,
    candle: &Candle,
    reason: ExitReason,
    costs: &CostModel,
    slippage: &mut dyn SlippageSource,
) {
    let position = &state.positions[index];
    let exit_price = costs.exit_price(candle.close, position.direction, slippage);
    let commission = costs.commission(position.volume, exit_price);
    let trade = state.close(index, exit_price, candle.timestamp, commission, reason);
    tracing::debug!(
        id = trade.id,
        pair = %trade.pair,
        reason = %reason,
        exit_price,
        pnl = trade.pnl,
        "closed position"
    );
}

/// Size and open a position for `signal` at the candle's close, if capital allows.
fn try_open(
    state: &mut RunState,
    signal: &Signal,
    candle: &Candle,
    risk: &RiskParams,
    config: &BacktestConfig,
    slippage: &mut dyn SlippageSource,
) {
    let quoted = candle.close;
    let volume = if quoted > 0.0 {
        state.capital * risk.max_position_fraction / quoted * signal.strength
    } else {
        0.0
    };
    if !(volume > 0.0) || volume * quoted > MAX_NOTIONAL_FRACTION * state.capital {
        tracing::debug!(
            pair = %config.pair,
            direction = %signal.direction,
            price = quoted,
            volume,
            capital = state.capital,
            "rejected signal"
        );
        return;
    }

    let direction = signal.direction;
    let entry_price = config.costs.entry_price(quoted, direction, slippage);
    let entry_commission = config.costs.commission(volume, entry_price);
    let id = state.next_trade_id();

    let position = Position {
        id,
        pair: config.pair.clone(),
        direction,
        volume,
        entry_price,
        entry_time: candle.timestamp,
        stop_loss: risk
            .stop_loss_pct
            .map(|pct| Position::stop_level(direction, entry_price, pct)),
        take_profit: risk
            .take_profit_pct
            .map(|pct| Position::take_level(direction, entry_price, pct)),
        max_holding: risk.max_holding,
        entry_commission,
    };
    tracing::debug!(
        id,
        pair = %config.pair,
        direction = %direction,
        volume,
        entry_price,
        "opened position"
    );
    state.open(position);
}

/// One independent run in a batch.
#[derive(Debug, Clone)]
pub struct BacktestJob {
    pub config: BacktestConfig,
    pub strategy: StrategyConfig,
    pub candles: Vec<Candle>,
}

/// Run every job in parallel. Job `i` draws slippage from its own `StdRng`
/// seeded with `seed + i`, so results do not depend on scheduling.
pub fn run_batch(jobs: &[BacktestJob], seed: u64) -> Vec<BacktestResult> {
    jobs.par_iter()
        .enumerate()
        .map(|(i, job)| {
            let rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let mut slippage = RandomSlippage::new(rng);
            run_backtest(&job.candles, &job.strategy, &job.config, &mut slippage)
        })
        .collect()
}
