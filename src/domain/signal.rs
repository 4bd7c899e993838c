//! Signal rules: indicator series to per-index buy/sell decisions.
//!
//! Each rule returns one `Option<Direction>` per price point; `None` is hold.
//! Crossover rules compare the current point with the one before it, so they
//! fire once on the point where the crossing happens. Any undefined operand
//! holds.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::indicator::{calculate_bollinger, calculate_macd, calculate_rsi, calculate_sma};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// +1 for buy, -1 for sell.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Buy => 1.0,
            Direction::Sell => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "buy"),
            Direction::Sell => write!(f, "sell"),
        }
    }
}

/// A directional trade request emitted by a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: NaiveDateTime,
    pub direction: Direction,
    /// Significance in [0, 1]; scales the position size.
    pub strength: f64,
    pub source: &'static str,
}

/// Per-index signal decisions; `None` means hold.
pub type SignalSeries = Vec<Option<Direction>>;

/// Direction of a crossing of `a` over `b` between points `i-1` and `i`.
fn crossing(a: &[Option<f64>], b: &[Option<f64>], i: usize) -> Option<Direction> {
    if i == 0 {
        return None;
    }
    let (a_prev, b_prev, a_now, b_now) = (a[i - 1]?, b[i - 1]?, a[i]?, b[i]?);
    if a_prev <= b_prev && a_now > b_now {
        Some(Direction::Buy)
    } else if a_prev >= b_prev && a_now < b_now {
        Some(Direction::Sell)
    } else {
        None
    }
}

pub fn sma_crossover(prices: &[f64], fast: usize, slow: usize) -> SignalSeries {
    let fast_sma = calculate_sma(prices, fast);
    let slow_sma = calculate_sma(prices, slow);
    (0..prices.len())
        .map(|i| crossing(&fast_sma, &slow_sma, i))
        .collect()
}

pub fn rsi_levels(prices: &[f64], period: usize, overbought: f64, oversold: f64) -> SignalSeries {
    calculate_rsi(prices, period)
        .into_iter()
        .map(|rsi| {
            let rsi = rsi?;
            if rsi > overbought {
                Some(Direction::Sell)
            } else if rsi < oversold {
                Some(Direction::Buy)
            } else {
                None
            }
        })
        .collect()
}

pub fn bollinger_touches(prices: &[f64], period: usize, std_dev: f64) -> SignalSeries {
    let bands = calculate_bollinger(prices, period, std_dev);
    (0..prices.len())
        .map(|i| {
            if i == 0 {
                return None;
            }
            let (upper, lower) = (bands.upper[i]?, bands.lower[i]?);
            let (price, prev) = (prices[i], prices[i - 1]);

            // Band touches are only meaningful when the previous point had bands too.
            if let (Some(prev_upper), Some(prev_lower)) = (bands.upper[i - 1], bands.lower[i - 1]) {
                if price >= upper && prev < prev_upper {
                    return Some(Direction::Sell);
                }
                if price <= lower && prev > prev_lower {
                    return Some(Direction::Buy);
                }
            }

            let (middle, prev_middle) = (bands.middle[i]?, bands.middle[i - 1]?);
            if prev <= prev_middle && price > middle {
                Some(Direction::Buy)
            } else if prev >= prev_middle && price < middle {
                Some(Direction::Sell)
            } else {
                None
            }
        })
        .collect()
}

pub fn macd_crossover(prices: &[f64], fast: usize, slow: usize, signal: usize) -> SignalSeries {
    let macd = calculate_macd(prices, fast, slow, signal);
    (0..prices.len())
        .map(|i| crossing(&macd.line, &macd.signal, i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(series: &SignalSeries, direction: Direction) -> usize {
        series.iter().filter(|s| **s == Some(direction)).count()
    }

    #[test]
    fn crossing_requires_prior_point() {
        let a = vec![Some(2.0)];
        let b = vec![Some(1.0)];
        assert_eq!(crossing(&a, &b, 0), None);
    }

    #[test]
    fn crossing_detects_both_directions() {
        let a = vec![Some(1.0), Some(2.0), Some(1.0)];
        let b = vec![Some(1.0), Some(1.5), Some(1.5)];
        assert_eq!(crossing(&a, &b, 1), Some(Direction::Buy));
        assert_eq!(crossing(&a, &b, 2), Some(Direction::Sell));
    }

    #[test]
    fn crossing_undefined_operand_holds() {
        let a = vec![None, Some(2.0)];
        let b = vec![Some(1.0), Some(1.0)];
        assert_eq!(crossing(&a, &b, 1), None);
    }

    #[test]
    fn sma_crossover_flat_has_no_signals() {
        let series = sma_crossover(&[1.0; 100], 10, 30);
        assert_eq!(series.len(), 100);
        assert!(series.iter().all(Option::is_none));
    }

    #[test]
    fn sma_crossover_fires_once_per_crossing() {
        // Falls, then rises: one bullish crossing.
        let mut prices: Vec<f64> = (0..40).map(|i| 100.0 - i as f64).collect();
        prices.extend((0..40).map(|i| 61.0 + 2.0 * i as f64));
        let series = sma_crossover(&prices, 5, 15);
        assert_eq!(count(&series, Direction::Buy), 1);
        assert_eq!(count(&series, Direction::Sell), 0);
    }

    #[test]
    fn sma_crossover_downturn_sells() {
        let mut prices: Vec<f64> = (0..60).map(|i| 1.0 + 0.001 * i as f64).collect();
        prices.extend((0..60).map(|i| 1.059 - 0.001 * i as f64));
        let series = sma_crossover(&prices, 10, 30);
        assert_eq!(count(&series, Direction::Sell), 1);
        let sell_at = series.iter().position(|s| *s == Some(Direction::Sell)).unwrap();
        assert!(sell_at > 60);
    }

    #[test]
    fn rsi_levels_fire_while_condition_holds() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let series = rsi_levels(&prices, 14, 70.0, 30.0);
        assert!(series[..14].iter().all(Option::is_none));
        assert!(series[14..].iter().all(|s| *s == Some(Direction::Sell)));
    }

    #[test]
    fn rsi_levels_oversold_buys() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let series = rsi_levels(&prices, 14, 70.0, 30.0);
        assert_eq!(series[14], Some(Direction::Buy));
    }

    #[test]
    fn bollinger_index_zero_and_warmup_hold() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + (i % 3) as f64).collect();
        let series = bollinger_touches(&prices, 20, 2.0);
        assert!(series[..20].iter().all(Option::is_none));
    }

    #[test]
    fn bollinger_drop_through_lower_band_buys() {
        let mut prices = vec![100.0; 20];
        prices.extend([100.5, 99.5, 100.5, 100.0, 80.0]);
        let series = bollinger_touches(&prices, 20, 2.0);
        assert_eq!(series[24], Some(Direction::Buy));
    }

    #[test]
    fn bollinger_spike_through_upper_band_sells() {
        let mut prices = vec![100.0; 20];
        prices.extend([100.5, 99.5, 100.5, 100.0, 120.0]);
        let series = bollinger_touches(&prices, 20, 2.0);
        assert_eq!(series[24], Some(Direction::Sell));
    }

    #[test]
    fn macd_crossover_on_reversal() {
        let mut prices: Vec<f64> = (0..50).map(|i| 100.0 - i as f64 * 0.5).collect();
        prices.extend((0..50).map(|i| 75.5 + i as f64 * 0.5));
        let series = macd_crossover(&prices, 12, 26, 9);
        assert!(count(&series, Direction::Buy) >= 1);
    }

    #[test]
    fn direction_display_and_sign() {
        assert_eq!(Direction::Buy.to_string(), "buy");
        assert_eq!(Direction::Sell.to_string(), "sell");
        assert_eq!(Direction::Buy.sign(), 1.0);
        assert_eq!(Direction::Sell.sign(), -1.0);
    }
}
