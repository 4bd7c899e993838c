//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(P[i-n+1..=i]). Warmup: first (n-1) points are undefined.

use crate::domain::indicator::{undefined, Series};

pub fn calculate_sma(prices: &[f64], period: usize) -> Series {
    if period == 0 || prices.len() < period {
        return undefined(prices.len());
    }

    let mut values = Vec::with_capacity(prices.len());
    for i in 0..prices.len() {
        if i + 1 < period {
            values.push(None);
        } else {
            let window = &prices[i + 1 - period..=i];
            values.push(Some(window.iter().sum::<f64>() / period as f64));
        }
    }
    values
}
