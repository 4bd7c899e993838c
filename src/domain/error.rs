//! Domain error types.

/// Top-level error type for fxbacktest.
///
/// Too little history is deliberately absent: a run over fewer than
/// [`MIN_CANDLES`](crate::domain::backtest::MIN_CANDLES) candles yields an
/// empty result instead of an error.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("market data error: {reason}")]
    Data { reason: String },

    #[error("no data for {pair}")]
    NoData { pair: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BacktestError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        BacktestError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) => 1,
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. } => 2,
            BacktestError::InvalidParameter { .. } => 3,
            BacktestError::Data { .. } | BacktestError::NoData { .. } => 5,
            BacktestError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
