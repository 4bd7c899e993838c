//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) points are undefined in all three bands.

use crate::domain::indicator::stddev::population_stddev;
use crate::domain::indicator::{calculate_sma, Series};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub middle: Series,
    pub upper: Series,
    pub lower: Series,
}

pub fn calculate_bollinger(prices: &[f64], period: usize, multiplier: f64) -> BollingerSeries {
    let middle = calculate_sma(prices, period);
    let mut upper = Vec::with_capacity(prices.len());
    let mut lower = Vec::with_capacity(prices.len());

    for (i, mid) in middle.iter().enumerate() {
        match mid {
            Some(mid) => {
                let stddev = population_stddev(&prices[i + 1 - period..=i]);
                upper.push(Some(mid + multiplier * stddev));
                lower.push(Some(mid - multiplier * stddev));
            }
            None => {
                upper.push(None);
                lower.push(None);
            }
        }
    }

    BollingerSeries {
        middle,
        upper,
        lower,
    }
}
