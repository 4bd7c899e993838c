//! Configuration validation.
//!
//! Checks every `[backtest]`, `[costs]`, `[strategy]` and `[risk]` key before
//! a run, so a bad file fails fast with the offending section and key.

use crate::domain::error::BacktestError;
use crate::domain::strategy::StrategyConfig;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_initial_capital(config)?;
    validate_dates(config)?;
    validate_pairs(config)?;
    validate_interval(config)?;
    validate_seed(config)?;
    validate_costs(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_strategy_name(config)?;
    validate_position_size(config)?;
    validate_exit_pct(config, "stop_loss_pct")?;
    validate_exit_pct(config, "take_profit_pct")?;
    validate_max_holding(config)?;
    StrategyConfig::from_config(config)?;
    Ok(())
}

/// Split a comma-separated pair list, normalizing to upper case.
pub fn parse_pairs(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|p| p.trim().to_uppercase())
        .filter(|p| !p.is_empty())
        .collect()
}

/// `BASE/QUOTE`, three ASCII letters each.
pub fn is_valid_pair(pair: &str) -> bool {
    match pair.split_once('/') {
        Some((base, quote)) => [base, quote]
            .iter()
            .all(|c| c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic())),
        None => false,
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> BacktestError {
    BacktestError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.get_double("backtest", "initial_capital", 0.0);
    if !(value > 0.0 && value.is_finite()) {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, BacktestError> {
    match value {
        None => Err(BacktestError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                &format!("invalid {field} format, expected YYYY-MM-DD"),
            )
        }),
    }
}

fn validate_pairs(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let pairs = config
        .get_string("backtest", "pairs")
        .map(|s| parse_pairs(&s))
        .unwrap_or_default();
    if pairs.is_empty() {
        return Err(BacktestError::ConfigMissing {
            section: "backtest".to_string(),
            key: "pairs".to_string(),
        });
    }
    if let Some(bad) = pairs.iter().find(|p| !is_valid_pair(p)) {
        return Err(invalid(
            "backtest",
            "pairs",
            &format!("{bad} is not a BASE/QUOTE pair"),
        ));
    }
    Ok(())
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if config.get_int("backtest", "interval_minutes", 60) < 1 {
        return Err(invalid(
            "backtest",
            "interval_minutes",
            "interval_minutes must be at least 1",
        ));
    }
    Ok(())
}

fn validate_seed(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if config.get_int("backtest", "seed", 0) < 0 {
        return Err(invalid("backtest", "seed", "seed must be non-negative"));
    }
    Ok(())
}

fn validate_costs(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    for key in ["commission_rate", "spread_cost", "slippage_factor"] {
        let value = config.get_double("costs", key, 0.0);
        if !(0.0..1.0).contains(&value) {
            return Err(invalid("costs", key, &format!("{key} must be in [0, 1)")));
        }
    }
    Ok(())
}

fn validate_strategy_name(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    match config.get_string("strategy", "name") {
        Some(s) if s.trim().is_empty() => Err(invalid(
            "strategy",
            "name",
            "name must not be empty",
        )),
        _ => Ok(()),
    }
}

fn validate_position_size(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.get_double("risk", "max_position_size", 0.1);
    if value <= 0.0 || value > 1.0 {
        return Err(invalid(
            "risk",
            "max_position_size",
            "max_position_size must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_exit_pct(config: &dyn ConfigPort, key: &str) -> Result<(), BacktestError> {
    let value = config.get_double("risk", key, 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid("risk", key, &format!("{key} must be in [0, 1)")));
    }
    Ok(())
}

fn validate_max_holding(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if config.get_int("risk", "max_holding_hours", 168) < 1 {
        return Err(invalid(
            "risk",
            "max_holding_hours",
            "max_holding_hours must be at least 1",
        ));
    }
    Ok(())
}
