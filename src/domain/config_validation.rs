//! Configuration validation.
//!
//! Validates all config fields before a backtest runs. Absent keys fall back
//! to the strategy defaults; present keys must parse and be in range.

use crate::domain::error::EmatrailError;
use crate::domain::strategy::{DEFAULT_FAST_SPAN, DEFAULT_SLOW_SPAN};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::str::FromStr;

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), EmatrailError> {
    validate_spans(config)?;
    validate_stop_pct(config)?;
    validate_initial_capital(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), EmatrailError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(invalid("data", "start_date", "start_date must not be after end_date"));
        }
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> EmatrailError {
    EmatrailError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_optional<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, EmatrailError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(section, key, &format!("cannot parse '{}'", s.trim()))),
    }
}

fn validate_spans(config: &dyn ConfigPort) -> Result<(), EmatrailError> {
    let mut spans = Vec::with_capacity(3);
    for key in ["fast_span", "slow_span", "filter_span"] {
        let span = parse_optional::<i64>(config, "strategy", key)?;
        if let Some(span) = span {
            if span < 1 {
                return Err(invalid("strategy", key, &format!("{key} must be at least 1")));
            }
        }
        spans.push(span);
    }

    let fast = spans[0].unwrap_or(DEFAULT_FAST_SPAN as i64);
    let slow = spans[1].unwrap_or(DEFAULT_SLOW_SPAN as i64);
    if fast >= slow {
        return Err(invalid(
            "strategy",
            "fast_span",
            "fast_span must be less than slow_span",
        ));
    }
    Ok(())
}

fn validate_stop_pct(config: &dyn ConfigPort) -> Result<(), EmatrailError> {
    if let Some(value) = parse_optional::<f64>(config, "strategy", "stop_pct")? {
        if !(value > 0.0 && value < 1.0) {
            return Err(invalid(
                "strategy",
                "stop_pct",
                "stop_pct must be strictly between 0 and 1",
            ));
        }
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), EmatrailError> {
    if let Some(value) = parse_optional::<f64>(config, "backtest", "initial_capital")? {
        if !(value > 0.0 && value.is_finite()) {
            return Err(invalid(
                "backtest",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
    }
    Ok(())
}

/// Optional `[data]` date in `YYYY-MM-DD` form.
pub fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, EmatrailError> {
    match config.get_string("data", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    "data",
                    key,
                    &format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            }),
    }
}
