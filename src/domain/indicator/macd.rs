//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow), defined once EMA(slow) has seen `slow` prices
//! Signal Line = EMA(signal) over the defined MACD values only, left-padded
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9

use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{defined_tail, left_pad, undefined, Series};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Series,
    pub signal: Series,
    pub histogram: Series,
}

impl MacdSeries {
    fn undefined(len: usize) -> Self {
        MacdSeries {
            line: undefined(len),
            signal: undefined(len),
            histogram: undefined(len),
        }
    }
}

pub fn calculate_macd(prices: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    let len = prices.len();
    if fast == 0 || slow == 0 || signal_period == 0 || len < slow {
        return MacdSeries::undefined(len);
    }

    let ema_fast = ema_values(prices, fast);
    let ema_slow = ema_values(prices, slow);

    let line: Series = (0..len)
        .map(|i| (i + 1 >= slow).then(|| ema_fast[i] - ema_slow[i]))
        .collect();

    let (offset, defined) = defined_tail(&line);
    let signal = if defined.len() >= signal_period {
        let smoothed = ema_values(&defined, signal_period)
            .into_iter()
            .map(Some)
            .collect();
        left_pad(len, offset, smoothed)
    } else {
        undefined(len)
    };

    let histogram = line
        .iter()
        .zip(&signal)
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    MacdSeries {
        line,
        signal,
        histogram,
    }
}
