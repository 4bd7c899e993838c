//! Market data port trait.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::Candle;
use chrono::NaiveDate;

pub trait DataPort {
    /// Candles for `pair` whose date lies in `[start_date, end_date]`,
    /// sorted by timestamp.
    fn fetch_candles(
        &self,
        pair: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Candle>, BacktestError>;
}
