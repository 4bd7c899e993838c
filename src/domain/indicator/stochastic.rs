//! Stochastic oscillator.
//!
//! %K = (C - lowest low(k)) / (highest high(k) - lowest low(k)) * 100
//! %D = SMA(%K, d) over the defined %K values, left-padded
//!
//! A flat window (highest high == lowest low) yields %K = 50.

use crate::domain::indicator::{calculate_sma, defined_tail, left_pad, undefined, Series};

pub const FLAT_WINDOW_K: f64 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSeries {
    pub k: Series,
    pub d: Series,
}

pub fn calculate_stochastic(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    k_period: usize,
    d_period: usize,
) -> StochasticSeries {
    let len = close.len();
    if high.len() != len || low.len() != len || k_period == 0 || len < k_period {
        return StochasticSeries {
            k: undefined(len),
            d: undefined(len),
        };
    }

    let k: Series = (0..len)
        .map(|i| {
            if i + 1 < k_period {
                return None;
            }
            let start = i + 1 - k_period;
            let period_high = high[start..=i].iter().copied().fold(f64::MIN, f64::max);
            let period_low = low[start..=i].iter().copied().fold(f64::MAX, f64::min);
            if period_high == period_low {
                Some(FLAT_WINDOW_K)
            } else {
                Some((close[i] - period_low) / (period_high - period_low) * 100.0)
            }
        })
        .collect();

    let (offset, defined) = defined_tail(&k);
    let d = if d_period > 0 && defined.len() >= d_period {
        left_pad(len, offset, calculate_sma(&defined, d_period))
    } else {
        undefined(len)
    };

    StochasticSeries { k, d }
}
