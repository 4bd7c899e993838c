//! Report generation port trait.

use crate::domain::error::BacktestError;
use crate::domain::metrics::BacktestResult;
use std::path::Path;

/// Port for writing backtest results.
pub trait ReportPort {
    fn write(&self, results: &[BacktestResult], output_path: &Path) -> Result<(), BacktestError>;
}
