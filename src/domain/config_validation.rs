//! Configuration validation and the typed settings built from it.
//!
//! Validation runs before anything touches price data so a bad INI file
//! fails fast with the offending section and key.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::StocklensError;
use crate::domain::screener::{DEFAULT_CONCURRENCY, ScreenerConfig};
use crate::domain::signal::StrategyKind;
use crate::domain::strategy::StrategyConfig;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_INITIAL_CAPITAL: i64 = 100_000_000;
pub const DEFAULT_LIVE_INTERVAL_SECS: i64 = 60;
pub const DEFAULT_SCREEN_LIMIT: i64 = 20;

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> StocklensError {
    StocklensError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> StocklensError {
    StocklensError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn required_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, StocklensError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(missing(section, key)),
    }
}

/// Decimal read from its string form so `0.0015` stays exact.
fn decimal_or(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: Decimal,
) -> Result<Decimal, StocklensError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Decimal::from_str(s.trim())
            .or_else(|_| Decimal::from_scientific(s.trim()))
            .map_err(|_| invalid(section, key, format!("'{}' is not a number", s.trim()))),
        _ => Ok(default),
    }
}

fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, StocklensError> {
    let value = required_string(config, "backtest", key)?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| {
        invalid(
            "backtest",
            key,
            format!("invalid {key} format, expected YYYY-MM-DD"),
        )
    })
}

fn initial_capital(config: &dyn ConfigPort) -> Result<Decimal, StocklensError> {
    let value = decimal_or(
        config,
        "backtest",
        "initial_capital",
        Decimal::from(DEFAULT_INITIAL_CAPITAL),
    )?;
    if value <= Decimal::ZERO {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(value)
}

fn commission_rate(config: &dyn ConfigPort) -> Result<Decimal, StocklensError> {
    let value = decimal_or(config, "backtest", "commission_rate", Decimal::new(15, 4))?;
    if value < Decimal::ZERO || value >= Decimal::ONE {
        return Err(invalid(
            "backtest",
            "commission_rate",
            "commission_rate must be in [0, 1)",
        ));
    }
    Ok(value)
}

fn risk_per_trade(config: &dyn ConfigPort) -> Result<Decimal, StocklensError> {
    let value = decimal_or(config, "backtest", "risk_per_trade", Decimal::new(1, 1))?;
    if value <= Decimal::ZERO || value > Decimal::ONE {
        return Err(invalid(
            "backtest",
            "risk_per_trade",
            "risk_per_trade must be in (0, 1]",
        ));
    }
    Ok(value)
}

fn dates(config: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), StocklensError> {
    let start_date = parse_date(config, "start_date")?;
    let end_date = parse_date(config, "end_date")?;
    if start_date > end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    Ok((start_date, end_date))
}

fn symbols(config: &dyn ConfigPort) -> Result<Vec<String>, StocklensError> {
    let raw = required_string(config, "backtest", "symbols")?;
    parse_symbols(&raw).map_err(|e| invalid("backtest", "symbols", e.to_string()))
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), StocklensError> {
    initial_capital(config)?;
    commission_rate(config)?;
    risk_per_trade(config)?;
    dates(config)?;
    symbols(config)?;
    Ok(())
}

/// `[strategy]` section: `type` is required, `name` defaults to the type,
/// `parameters` is an optional JSON object.
pub fn build_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, StocklensError> {
    let type_tag = required_string(config, "strategy", "type")?;
    let name = config.get_string_or("strategy", "name", &type_tag);
    let params = match config.get_string("strategy", "parameters") {
        Some(raw) if !raw.trim().is_empty() => {
            let value: Value = serde_json::from_str(&raw)
                .map_err(|e| invalid("strategy", "parameters", e.to_string()))?;
            if !value.is_object() {
                return Err(invalid(
                    "strategy",
                    "parameters",
                    "parameters must be a JSON object",
                ));
            }
            value
        }
        _ => Value::Object(Default::default()),
    };
    StrategyConfig::from_json(&name, &type_tag, &params)
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, StocklensError> {
    validate_backtest_config(config)?;
    let (start_date, end_date) = dates(config)?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: initial_capital(config)?,
        commission_rate: commission_rate(config)?,
        risk_per_trade: risk_per_trade(config)?,
        allow_add_to_position: config.get_bool("backtest", "allow_add_to_position", false),
        symbols: symbols(config)?,
        strategy: build_strategy_config(config)?,
    })
}

pub fn build_screener_config(config: &dyn ConfigPort) -> Result<ScreenerConfig, StocklensError> {
    let concurrency = config.get_int("screener", "concurrency", DEFAULT_CONCURRENCY as i64);
    if concurrency < 1 {
        return Err(invalid(
            "screener",
            "concurrency",
            "concurrency must be at least 1",
        ));
    }
    let limit = config.get_int("screener", "limit", DEFAULT_SCREEN_LIMIT);
    if limit < 1 {
        return Err(invalid("screener", "limit", "limit must be at least 1"));
    }
    let min_trading_value = decimal_or(config, "screener", "min_trading_value", Decimal::ZERO)?;
    if min_trading_value < Decimal::ZERO {
        return Err(invalid(
            "screener",
            "min_trading_value",
            "min_trading_value must be non-negative",
        ));
    }

    Ok(ScreenerConfig {
        concurrency: concurrency as usize,
        min_trading_value,
        limit: limit as usize,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveSettings {
    pub strategy: StrategyKind,
    pub interval: Duration,
}

pub fn build_live_settings(config: &dyn ConfigPort) -> Result<LiveSettings, StocklensError> {
    let name = config.get_string_or("live", "strategy", "composite");
    let strategy = name
        .parse::<StrategyKind>()
        .map_err(|_| invalid("live", "strategy", format!("unknown strategy '{name}'")))?;
    let secs = config.get_int("live", "interval_secs", DEFAULT_LIVE_INTERVAL_SECS);
    if secs < 1 {
        return Err(invalid(
            "live",
            "interval_secs",
            "interval_secs must be at least 1",
        ));
    }
    Ok(LiveSettings {
        strategy,
        interval: Duration::from_secs(secs as u64),
    })
}

pub fn data_dir(config: &dyn ConfigPort) -> Result<PathBuf, StocklensError> {
    required_string(config, "data", "dir").map(PathBuf::from)
}

pub fn signal_store_path(config: &dyn ConfigPort) -> Result<PathBuf, StocklensError> {
    required_string(config, "signals", "store").map(PathBuf::from)
}
