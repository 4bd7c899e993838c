//! Full indicator set computed over a candle sequence.
//!
//! Bundles every indicator in [`crate::domain::indicator`] under a stable name
//! so callers (the `indicators` CLI command, diagnostics) can treat them as one
//! table aligned with the candles.

use std::collections::BTreeMap;

use crate::domain::indicator::{
    bollinger, calculate_atr, calculate_bollinger, calculate_ema, calculate_macd, calculate_rsi,
    calculate_sma, calculate_stochastic, calculate_williams_r, macd, Series,
};
use crate::domain::ohlcv::{closes, highs, lows, Candle};

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub ema_period: usize,
    pub rsi_period: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr_period: usize,
    pub williams_period: usize,
    pub stoch_k: usize,
    pub stoch_d: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            sma_fast: 10,
            sma_slow: 30,
            ema_period: 12,
            rsi_period: 14,
            bb_period: bollinger::DEFAULT_PERIOD,
            bb_std_dev: bollinger::DEFAULT_MULTIPLIER,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            atr_period: 14,
            williams_period: 14,
            stoch_k: 14,
            stoch_d: 3,
        }
    }
}

/// Named indicator series, all of the same length as the source candles.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    len: usize,
    series: BTreeMap<&'static str, Series>,
}

impl IndicatorSet {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, name: &str) -> Option<&[Option<f64>]> {
        self.series.get(name).map(Vec::as_slice)
    }

    /// Value of `name` at `index`; `None` for unknown names and warm-up points.
    pub fn value(&self, name: &str, index: usize) -> Option<f64> {
        self.series.get(name)?.get(index).copied().flatten()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.series.keys().copied()
    }

    fn insert(&mut self, name: &'static str, series: Series) {
        debug_assert_eq!(series.len(), self.len, "{name} misaligned");
        self.series.insert(name, series);
    }
}

pub fn compute_indicators(candles: &[Candle], params: &IndicatorParams) -> IndicatorSet {
    let close = closes(candles);
    let high = highs(candles);
    let low = lows(candles);

    let mut set = IndicatorSet {
        len: candles.len(),
        series: BTreeMap::new(),
    };

    set.insert("sma_fast", calculate_sma(&close, params.sma_fast));
    set.insert("sma_slow", calculate_sma(&close, params.sma_slow));
    set.insert("ema", calculate_ema(&close, params.ema_period));
    set.insert("rsi", calculate_rsi(&close, params.rsi_period));
    set.insert(
        "atr",
        calculate_atr(&high, &low, &close, params.atr_period),
    );
    set.insert(
        "williams_r",
        calculate_williams_r(&high, &low, &close, params.williams_period),
    );

    let bands = calculate_bollinger(&close, params.bb_period, params.bb_std_dev);
    set.insert("bb_middle", bands.middle);
    set.insert("bb_upper", bands.upper);
    set.insert("bb_lower", bands.lower);

    let macd = calculate_macd(
        &close,
        params.macd_fast,
        params.macd_slow,
        params.macd_signal,
    );
    set.insert("macd_line", macd.line);
    set.insert("macd_signal", macd.signal);
    set.insert("macd_histogram", macd.histogram);

    let stoch = calculate_stochastic(&high, &low, &close, params.stoch_k, params.stoch_d);
    set.insert("stoch_k", stoch.k);
    set.insert("stoch_d", stoch.d);

    set
}
