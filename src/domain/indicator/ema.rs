//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the first price, then EMA[i] = P[i]*k + EMA[i-1]*(1-k).
//! Defined from the first point: there is no warmup gap.

use crate::domain::indicator::{undefined, Series};

pub fn calculate_ema(prices: &[f64], period: usize) -> Series {
    if period == 0 {
        return undefined(prices.len());
    }
    ema_values(prices, period).into_iter().map(Some).collect()
}

/// Raw EMA values for callers that smooth an already-defined run.
pub(crate) fn ema_values(prices: &[f64], period: usize) -> Vec<f64> {
    let Some(&first) = prices.first() else {
        return Vec::new();
    };

    let k = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(prices.len());
    let mut ema = first;
    values.push(ema);

    for &price in &prices[1..] {
        ema = price * k + ema * (1.0 - k);
        values.push(ema);
    }
    values
}
