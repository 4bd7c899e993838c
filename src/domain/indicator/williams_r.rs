//! Williams %R.
//!
//! %R = (highest high(n) - C) / (highest high(n) - lowest low(n)) * -100, in [-100, 0].
//! A flat window yields -50.

use crate::domain::indicator::{undefined, Series};

pub const FLAT_WINDOW_R: f64 = -50.0;

pub fn calculate_williams_r(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Series {
    let len = close.len();
    if high.len() != len || low.len() != len || period == 0 || len < period {
        return undefined(len);
    }

    (0..len)
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let start = i + 1 - period;
            let period_high = high[start..=i].iter().copied().fold(f64::MIN, f64::max);
            let period_low = low[start..=i].iter().copied().fold(f64::MAX, f64::min);
            if period_high == period_low {
                Some(FLAT_WINDOW_R)
            } else {
                Some((period_high - close[i]) / (period_high - period_low) * -100.0)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn williams_warmup() {
        let p: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let wr = calculate_williams_r(&p, &p, &p, 3);
        assert!(wr[1].is_none());
        assert!(wr[2].is_some());
    }

    #[test]
    fn williams_close_at_high_is_zero() {
        let wr = calculate_williams_r(&[10.0, 12.0], &[8.0, 9.0], &[9.0, 12.0], 2);
        assert!(wr[1].unwrap().abs() < 1e-12);
    }

    #[test]
    fn williams_close_at_low_is_minus_100() {
        let wr = calculate_williams_r(&[10.0, 12.0], &[8.0, 9.0], &[9.0, 8.0], 2);
        assert!((wr[1].unwrap() + 100.0).abs() < 1e-12);
    }

    #[test]
    fn williams_flat_window_fallback() {
        let flat = [2.0; 15];
        let wr = calculate_williams_r(&flat, &flat, &flat, 14);
        assert_eq!(wr[13], Some(FLAT_WINDOW_R));
    }

    #[test]
    fn williams_short_input() {
        assert_eq!(calculate_williams_r(&[1.0], &[1.0], &[1.0], 14), vec![None]);
    }
}
