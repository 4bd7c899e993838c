#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use fxbacktest::domain::backtest::BacktestConfig;
use fxbacktest::domain::error::BacktestError;
pub use fxbacktest::domain::ohlcv::Candle;
use fxbacktest::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, pair: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(pair.to_string(), candles);
        self
    }

    pub fn with_error(mut self, pair: &str, reason: &str) -> Self {
        self.errors.insert(pair.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_candles(
        &self,
        pair: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<Candle>, BacktestError> {
        if let Some(reason) = self.errors.get(pair) {
            return Err(BacktestError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(pair).cloned().unwrap_or_default())
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn start_time() -> NaiveDateTime {
    date("2024-01-01").and_hms_opt(0, 0, 0).unwrap()
}

/// Hourly candles from 2024-01-01 00:00 with the given closes; open is the
/// previous close and the wicks are 0.1% either side.
pub fn hourly_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: start_time() + Duration::hours(i as i64),
                open,
                high: open.max(close) * 1.001,
                low: open.min(close) * 0.999,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

pub fn flat_candles(n: usize, price: f64) -> Vec<Candle> {
    hourly_candles(&vec![price; n])
}

/// `n` closes rising by `step` from `from`.
pub fn ramp_candles(n: usize, from: f64, step: f64) -> Vec<Candle> {
    let closes: Vec<f64> = (0..n).map(|i| from + step * i as f64).collect();
    hourly_candles(&closes)
}

/// Flat for `flat` candles, then a steady climb for `up` more.
pub fn flat_then_up(flat: usize, up: usize, price: f64, step: f64) -> Vec<Candle> {
    let closes: Vec<f64> = (0..flat + up)
        .map(|i| {
            if i < flat {
                price
            } else {
                price + step * (i - flat + 1) as f64
            }
        })
        .collect();
    hourly_candles(&closes)
}

/// Falling, then rising: forces the fast SMA under and then back over the slow one.
pub fn v_shape(down: usize, up: usize, price: f64, step: f64) -> Vec<Candle> {
    let mut closes: Vec<f64> = (0..down).map(|i| price - step * i as f64).collect();
    let bottom = price - step * down as f64;
    closes.extend((0..up).map(|i| bottom + step * i as f64));
    hourly_candles(&closes)
}

pub fn make_config(pair: &str, capital: f64) -> BacktestConfig {
    BacktestConfig::new(pair, date("2024-01-01"), date("2024-03-01"), capital)
}
