//! Pre-flight validation of backtest and strategy configuration.
//!
//! Configuration problems are fatal for a run and must surface before any
//! simulation starts.

use crate::domain::error::TradesimError;
use crate::domain::rule_parser;
use crate::domain::strategy::ThresholdKind;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn parse_config_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn require_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, TradesimError> {
    config
        .get_string(section, key)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| TradesimError::ConfigMissing {
            section: section.into(),
            key: key.into(),
        })
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TradesimError {
    TradesimError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: reason.into(),
    }
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    require_string(config, "backtest", "symbol")?;
    require_string(config, "backtest", "timeframe")?;

    let start_str = require_string(config, "backtest", "start_date")?;
    let start = parse_config_date(&start_str).ok_or_else(|| {
        invalid("backtest", "start_date", "invalid date format (expected YYYY-MM-DD)")
    })?;
    let end_str = require_string(config, "backtest", "end_date")?;
    let end = parse_config_date(&end_str).ok_or_else(|| {
        invalid("backtest", "end_date", "invalid date format (expected YYYY-MM-DD)")
    })?;
    if end < start {
        return Err(invalid("backtest", "end_date", "end_date is before start_date"));
    }

    let capital = config.get_double("backtest", "initial_capital", 10_000.0);
    if !(capital > 0.0) {
        return Err(invalid(
            "backtest",
            "initial_capital",
            format!("must be positive, got {}", capital),
        ));
    }

    let commission = config.get_double("backtest", "commission", 4.0);
    if commission < 0.0 {
        return Err(invalid(
            "backtest",
            "commission",
            format!("must not be negative, got {}", commission),
        ));
    }

    let slippage = config.get_double("backtest", "slippage_pct", 0.5);
    if slippage < 0.0 {
        return Err(invalid(
            "backtest",
            "slippage_pct",
            format!("must not be negative, got {}", slippage),
        ));
    }

    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let entry_str = require_string(config, "strategy", "entry_rules")?;
    let entry_rules = rule_parser::parse_entry_rules(&entry_str)?;
    if entry_rules.is_empty() {
        return Err(invalid("strategy", "entry_rules", "at least one entry rule is required"));
    }

    if let Some(exit_str) = config.get_string("strategy", "exit_rules") {
        rule_parser::parse_exit_rules(&exit_str)?;
    }

    validate_stop(config, "stop_loss_type", "stop_loss_value")?;
    validate_stop(config, "take_profit_type", "take_profit_value")?;

    let max_hold = config.get_int("strategy", "max_hold_bars", 0);
    if max_hold < 0 {
        return Err(invalid(
            "strategy",
            "max_hold_bars",
            format!("must not be negative, got {}", max_hold),
        ));
    }

    Ok(())
}

fn validate_stop(
    config: &dyn ConfigPort,
    type_key: &str,
    value_key: &str,
) -> Result<(), TradesimError> {
    let Some(kind_str) = config
        .get_string("strategy", type_key)
        .filter(|s| !s.trim().is_empty())
    else {
        return Ok(());
    };

    if ThresholdKind::parse(&kind_str).is_none() {
        return Err(invalid(
            "strategy",
            type_key,
            format!(
                "unknown type '{}' (expected percentage, points, ticks, or atr)",
                kind_str
            ),
        ));
    }

    let value = config.get_double("strategy", value_key, 0.0);
    if !(value > 0.0) {
        return Err(invalid(
            "strategy",
            value_key,
            format!("must be positive when {} is set, got {}", type_key, value),
        ));
    }

    Ok(())
}
