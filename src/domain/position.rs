//! Open positions and the trade ledger.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::fmt;

use crate::domain::signal::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    MaxHoldingTime,
    RunEnd,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::MaxHoldingTime => "max_holding_time",
            ExitReason::RunEnd => "run_end",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub id: u64,
    pub pair: String,
    pub direction: Direction,
    pub volume: f64,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub max_holding: Duration,
    pub entry_commission: f64,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.direction == Direction::Buy
    }

    /// Stop-loss level `pct` away from `entry_price`, on the losing side.
    pub fn stop_level(direction: Direction, entry_price: f64, pct: f64) -> f64 {
        entry_price * (1.0 - direction.sign() * pct)
    }

    /// Take-profit level `pct` away from `entry_price`, on the winning side.
    pub fn take_level(direction: Direction, entry_price: f64, pct: f64) -> f64 {
        entry_price * (1.0 + direction.sign() * pct)
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        match self.stop_loss {
            Some(level) if self.is_long() => price <= level,
            Some(level) => price >= level,
            None => false,
        }
    }

    pub fn should_take_profit(&self, price: f64) -> bool {
        match self.take_profit {
            Some(level) if self.is_long() => price >= level,
            Some(level) => price <= level,
            None => false,
        }
    }

    /// Held strictly longer than the limit.
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        now - self.entry_time > self.max_holding
    }

    /// First exit condition met at `price` and `now`, in precedence
    /// stop-loss, take-profit, holding time.
    pub fn exit_reason(&self, price: f64, now: NaiveDateTime) -> Option<ExitReason> {
        if self.should_stop_loss(price) {
            Some(ExitReason::StopLoss)
        } else if self.should_take_profit(price) {
            Some(ExitReason::TakeProfit)
        } else if self.is_expired(now) {
            Some(ExitReason::MaxHoldingTime)
        } else {
            None
        }
    }

    /// Price P&L of closing at `exit_price`, before commissions.
    pub fn pnl(&self, exit_price: f64) -> f64 {
        self.direction.sign() * (exit_price - self.entry_price) * self.volume
    }

    pub fn close(
        self,
        exit_price: f64,
        exit_time: NaiveDateTime,
        exit_commission: f64,
        reason: ExitReason,
    ) -> ClosedTrade {
        ClosedTrade {
            id: self.id,
            pnl: self.pnl(exit_price),
            commission: self.entry_commission + exit_commission,
            pair: self.pair,
            direction: self.direction,
            volume: self.volume,
            entry_price: self.entry_price,
            entry_time: self.entry_time,
            exit_price,
            exit_time,
            exit_reason: reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedTrade {
    pub id: u64,
    pub pair: String,
    pub direction: Direction,
    pub volume: f64,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_time: NaiveDateTime,
    /// Price P&L; commissions are in `commission`.
    pub pnl: f64,
    /// Entry plus exit commission.
    pub commission: f64,
    pub exit_reason: ExitReason,
}

impl ClosedTrade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.pnl < 0.0
    }
}
