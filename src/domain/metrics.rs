//! Performance statistics over a finished run.

use chrono::NaiveDate;
use serde::Serialize;

use super::backtest::BacktestConfig;
use super::portfolio::{DailyReturn, RunState};
use super::position::ClosedTrade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub pair: String,
    pub strategy: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_return: f64,
    pub total_return_percent: f64,
    pub max_drawdown: f64,
    pub max_drawdown_percent: f64,
    pub sharpe_ratio: f64,
    pub win_rate: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub avg_win: f64,
    /// Mean P&L of losing trades; negative.
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub trades: Vec<ClosedTrade>,
    pub daily_returns: Vec<DailyReturn>,
}

/// Combined totals over the pairs of one batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub pairs: Vec<String>,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_return: f64,
    pub total_return_percent: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    /// Winning over total trades across every pair; 0 without trades.
    pub win_rate: f64,
}

impl BatchSummary {
    pub fn from_results(results: &[BacktestResult]) -> Self {
        let initial_capital: f64 = results.iter().map(|r| r.initial_capital).sum();
        let final_capital: f64 = results.iter().map(|r| r.final_capital).sum();
        let total_trades: usize = results.iter().map(|r| r.total_trades).sum();
        let winning_trades: usize = results.iter().map(|r| r.winning_trades).sum();
        let total_return = final_capital - initial_capital;

        BatchSummary {
            pairs: results.iter().map(|r| r.pair.clone()).collect(),
            initial_capital,
            final_capital,
            total_return,
            total_return_percent: if initial_capital > 0.0 {
                total_return / initial_capital * 100.0
            } else {
                0.0
            },
            total_trades,
            winning_trades,
            win_rate: if total_trades > 0 {
                winning_trades as f64 / total_trades as f64
            } else {
                0.0
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TradeStats {
    pub total: usize,
    pub winning: usize,
    pub losing: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
}

impl TradeStats {
    pub fn compute(trades: &[ClosedTrade]) -> Self {
        let mut winning = 0usize;
        let mut losing = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;

        for trade in trades {
            if trade.is_winner() {
                winning += 1;
                total_wins += trade.pnl;
            } else if trade.is_loser() {
                losing += 1;
                total_losses += trade.pnl;
            }
        }

        let total = trades.len();
        let win_rate = if total > 0 {
            winning as f64 / total as f64
        } else {
            0.0
        };
        let avg_win = if winning > 0 {
            total_wins / winning as f64
        } else {
            0.0
        };
        let avg_loss = if losing > 0 {
            total_losses / losing as f64
        } else {
            0.0
        };

        let profit_factor = if avg_loss != 0.0 {
            (avg_win / avg_loss).abs()
        } else {
            f64::INFINITY
        };

        TradeStats {
            total,
            winning,
            losing,
            win_rate,
            avg_win,
            avg_loss,
            profit_factor,
        }
    }
}

/// Annualized Sharpe ratio of daily returns, zero risk-free rate.
///
/// Fewer than two samples, or zero dispersion, gives 0.
pub fn sharpe_ratio(daily_returns: &[DailyReturn]) -> f64 {
    if daily_returns.len() < 2 {
        return 0.0;
    }
    let n = daily_returns.len() as f64;
    let mean = daily_returns.iter().map(|r| r.daily_return).sum::<f64>() / n;
    let variance = daily_returns
        .iter()
        .map(|r| (r.daily_return - mean).powi(2))
        .sum::<f64>()
        / n;
    let std_dev = variance.sqrt();
    if std_dev == 0.0 {
        0.0
    } else {
        mean / std_dev * TRADING_DAYS_PER_YEAR.sqrt()
    }
}

impl BacktestResult {
    /// All-zero result for a run that never started.
    pub fn empty(config: &BacktestConfig, strategy: &str) -> Self {
        BacktestResult {
            pair: config.pair.clone(),
            strategy: strategy.to_string(),
            start_date: config.start_date,
            end_date: config.end_date,
            initial_capital: config.initial_capital,
            final_capital: config.initial_capital,
            total_return: 0.0,
            total_return_percent: 0.0,
            max_drawdown: 0.0,
            max_drawdown_percent: 0.0,
            sharpe_ratio: 0.0,
            win_rate: 0.0,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            avg_win: 0.0,
            avg_loss: 0.0,
            profit_factor: 0.0,
            trades: Vec::new(),
            daily_returns: Vec::new(),
        }
    }

    pub fn from_run(config: &BacktestConfig, strategy: &str, state: RunState) -> Self {
        let stats = TradeStats::compute(&state.closed_trades);
        let initial = state.initial_capital;
        let total_return = state.capital - initial;

        BacktestResult {
            pair: config.pair.clone(),
            strategy: strategy.to_string(),
            start_date: config.start_date,
            end_date: config.end_date,
            initial_capital: initial,
            final_capital: state.capital,
            total_return,
            total_return_percent: total_return / initial * 100.0,
            max_drawdown: state.max_drawdown * initial,
            max_drawdown_percent: state.max_drawdown * 100.0,
            sharpe_ratio: sharpe_ratio(&state.daily_returns),
            win_rate: stats.win_rate,
            total_trades: stats.total,
            winning_trades: stats.winning,
            losing_trades: stats.losing,
            avg_win: stats.avg_win,
            avg_loss: stats.avg_loss,
            profit_factor: stats.profit_factor,
            trades: state.closed_trades,
            daily_returns: state.daily_returns,
        }
    }

    /// Sum of commissions over the ledger.
    pub fn total_commission(&self) -> f64 {
        self.trades.iter().map(|t| t.commission).sum()
    }
}
