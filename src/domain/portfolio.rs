//! Mutable state of one simulation run.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::position::{ClosedTrade, ExitReason, Position};

/// Capital change over one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReturn {
    pub date: NaiveDate,
    #[serde(rename = "return")]
    pub daily_return: f64,
    /// Capital at the end of the day.
    pub capital: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    pub initial_capital: f64,
    pub capital: f64,
    pub peak_capital: f64,
    /// Largest `(peak - capital) / peak` seen so far.
    pub max_drawdown: f64,
    pub positions: Vec<Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub daily_returns: Vec<DailyReturn>,
    current_day: Option<NaiveDate>,
    day_start_capital: f64,
    next_trade_id: u64,
}

impl RunState {
    pub fn new(initial_capital: f64) -> Self {
        RunState {
            initial_capital,
            capital: initial_capital,
            peak_capital: initial_capital,
            max_drawdown: 0.0,
            positions: Vec::new(),
            closed_trades: Vec::new(),
            daily_returns: Vec::new(),
            current_day: None,
            day_start_capital: initial_capital,
            next_trade_id: 1,
        }
    }

    /// Record the finished day's return when `day` starts a new one.
    ///
    /// The first call only sets the baseline.
    pub fn roll_day(&mut self, day: NaiveDate) {
        match self.current_day {
            Some(current) if current != day => {
                let daily_return = if self.day_start_capital != 0.0 {
                    (self.capital - self.day_start_capital) / self.day_start_capital
                } else {
                    0.0
                };
                self.daily_returns.push(DailyReturn {
                    date: current,
                    daily_return,
                    capital: self.capital,
                });
                self.day_start_capital = self.capital;
                self.current_day = Some(day);
            }
            Some(_) => {}
            None => {
                self.current_day = Some(day);
                self.day_start_capital = self.capital;
            }
        }
    }

    pub fn update_drawdown(&mut self) {
        if self.capital > self.peak_capital {
            self.peak_capital = self.capital;
        }
        if self.peak_capital > 0.0 {
            let drawdown = (self.peak_capital - self.capital) / self.peak_capital;
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }
    }

    pub fn next_trade_id(&mut self) -> u64 {
        let id = self.next_trade_id;
        self.next_trade_id += 1;
        id
    }

    /// Take ownership of a new position; its entry commission is charged now.
    pub fn open(&mut self, position: Position) {
        self.capital -= position.entry_commission;
        self.positions.push(position);
    }

    /// Close the position at `index`, crediting P&L net of the exit commission.
    pub fn close(
        &mut self,
        index: usize,
        exit_price: f64,
        exit_time: NaiveDateTime,
        exit_commission: f64,
        reason: ExitReason,
    ) -> &ClosedTrade {
        let position = self.positions.remove(index);
        let trade = position.close(exit_price, exit_time, exit_commission, reason);
        self.capital += trade.pnl - exit_commission;
        self.closed_trades.push(trade);
        &self.closed_trades[self.closed_trades.len() - 1]
    }

    pub fn has_open_positions(&self) -> bool {
        !self.positions.is_empty()
    }
}
