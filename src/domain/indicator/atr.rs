//! Average True Range.
//!
//! TR[0] = H[0] - L[0]; TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|).
//! ATR = EMA(TR, n), so like the EMA it is defined from the first point.

use crate::domain::indicator::{calculate_ema, undefined, Series};
use crate::domain::ohlcv::true_range;

pub fn calculate_atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Series {
    let len = close.len();
    if high.len() != len || low.len() != len || len < 2 {
        return undefined(len);
    }

    let true_ranges: Vec<f64> = (0..len)
        .map(|i| {
            let prev_close = i.checked_sub(1).map(|p| close[p]);
            true_range(high[i], low[i], prev_close)
        })
        .collect();

    calculate_ema(&true_ranges, period)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atr_first_point_is_high_low() {
        let atr = calculate_atr(&[110.0, 115.0], &[100.0, 105.0], &[105.0, 110.0], 3);
        assert!((atr[0].unwrap() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn atr_constant_range() {
        let high = [110.0; 6];
        let low = [90.0; 6];
        let close = [100.0; 6];
        for v in calculate_atr(&high, &low, &close, 3) {
            assert!((v.unwrap() - 20.0).abs() < 1e-12);
        }
    }

    #[test]
    fn atr_handles_gaps() {
        // second candle gaps up: |130 - 105| = 25 beats high-low = 10
        let atr = calculate_atr(&[110.0, 130.0], &[100.0, 120.0], &[105.0, 125.0], 3);
        let k = 2.0 / 4.0;
        let expected = 25.0 * k + 10.0 * (1.0 - k);
        assert!((atr[1].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn atr_insufficient_points() {
        assert_eq!(calculate_atr(&[1.0], &[1.0], &[1.0], 14), vec![None]);
    }

    #[test]
    fn atr_mismatched_lengths() {
        assert_eq!(
            calculate_atr(&[1.0, 2.0], &[1.0, 2.0], &[1.0, 2.0, 3.0], 14),
            vec![None, None, None]
        );
    }
}
