//! Rolling standard deviation.
//!
//! Population standard deviation over n prices (divides by N, not N-1).
//! STDDEV(n)[i] = sqrt(sum((P[i-j] - SMA(n)[i])^2 for j in 0..n) / n)
//! Warmup: first (n-1) points are undefined.

use crate::domain::indicator::{undefined, Series};

pub fn calculate_stddev(prices: &[f64], period: usize) -> Series {
    if period == 0 || prices.len() < period {
        return undefined(prices.len());
    }

    (0..prices.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                Some(population_stddev(&prices[i + 1 - period..=i]))
            }
        })
        .collect()
}

pub fn population_stddev(window: &[f64]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
