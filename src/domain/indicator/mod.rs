//! Technical indicator implementations.
//!
//! Every indicator is a pure function from price slices to a [`Series`] of the
//! same length. Warm-up positions, and every position of an input that is too
//! short for the window, are `None`.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod stochastic;
pub mod williams_r;

pub use atr::calculate_atr;
pub use bollinger::{calculate_bollinger, BollingerSeries};
pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdSeries};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stddev::calculate_stddev;
pub use stochastic::{calculate_stochastic, StochasticSeries};
pub use williams_r::calculate_williams_r;

/// Indicator values aligned 1:1 with the candles they were computed from.
pub type Series = Vec<Option<f64>>;

/// An all-undefined series of `len` points.
pub fn undefined(len: usize) -> Series {
    vec![None; len]
}

/// Split a series into the index of its first defined value and the
/// contiguous run of defined values from there on.
///
/// Used by indicators that smooth another indicator (MACD signal, %D) over
/// only its defined portion before left-padding the result back into place.
pub(crate) fn defined_tail(series: &[Option<f64>]) -> (usize, Vec<f64>) {
    let start = series
        .iter()
        .position(|v| v.is_some())
        .unwrap_or(series.len());
    let values = series[start..].iter().map(|v| v.unwrap_or(0.0)).collect();
    (start, values)
}

/// Inverse of [`defined_tail`]: place `tail` at `offset` in a series of `len`.
pub(crate) fn left_pad(len: usize, offset: usize, tail: Series) -> Series {
    let mut out = undefined(offset);
    out.extend(tail);
    out.resize(len, None);
    out
}
