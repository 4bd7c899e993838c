//! JSON report adapter implementing ReportPort.
//!
//! Writes the results as one pretty-printed JSON array. Non-finite numbers
//! (an infinite profit factor) serialize as `null`.

use std::fs;
use std::path::Path;

use crate::domain::error::BacktestError;
use crate::domain::metrics::BacktestResult;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        JsonReportAdapter
    }

    pub fn render(&self, results: &[BacktestResult]) -> Result<String, BacktestError> {
        serde_json::to_string_pretty(results).map_err(|e| BacktestError::Report {
            reason: format!("failed to serialize results: {}", e),
        })
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, results: &[BacktestResult], output_path: &Path) -> Result<(), BacktestError> {
        let json = self.render(results)?;
        fs::write(output_path, json).map_err(|e| BacktestError::Report {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        })
    }
}
