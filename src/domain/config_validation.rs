//! Configuration validation.
//!
//! Validates all config fields before a backtest runs and reports the first
//! problem found.

use crate::adapters::local_runtime::LocalRuntimeConfig;
use crate::domain::error::SectraderError;
use crate::domain::market::Timerange;
use crate::domain::strategy::strategy_from_config;
use crate::ports::config_port::ConfigPort;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SectraderError> {
    validate_datadir(config)?;
    validate_pair(config)?;
    validate_timeframe(config)?;
    validate_timerange(config)?;
    validate_mpc(config)?;
    validate_logging(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SectraderError> {
    strategy_from_config(config).map(|_| ())
}

fn require(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, SectraderError> {
    config
        .get_trimmed(section, key)
        .ok_or_else(|| SectraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })
}

fn validate_datadir(config: &dyn ConfigPort) -> Result<(), SectraderError> {
    require(config, "data", "datadir").map(|_| ())
}

fn validate_pair(config: &dyn ConfigPort) -> Result<(), SectraderError> {
    let pair = require(config, "backtest", "pair")?;
    if pair.contains(char::is_whitespace) {
        return Err(SectraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "pair".to_string(),
            reason: "pair must not contain whitespace".to_string(),
        });
    }
    Ok(())
}

fn validate_timeframe(config: &dyn ConfigPort) -> Result<(), SectraderError> {
    let timeframe = require(config, "backtest", "timeframe")?;
    check_timeframe(&timeframe).map_err(|reason| SectraderError::ConfigInvalid {
        section: "backtest".to_string(),
        key: "timeframe".to_string(),
        reason,
    })
}

/// A timeframe is a positive count followed by one of `m`, `h`, `d`, `w`.
pub fn check_timeframe(timeframe: &str) -> Result<(), String> {
    let unit_at = timeframe.char_indices().last().map_or(0, |(i, _)| i);
    let (count, unit) = timeframe.split_at(unit_at);
    if !matches!(unit, "m" | "h" | "d" | "w") {
        return Err(format!("'{timeframe}' must end with a unit of m, h, d or w"));
    }
    match count.parse::<u32>() {
        Ok(n) if n > 0 => Ok(()),
        _ => Err(format!("'{timeframe}' must start with a positive count")),
    }
}

fn validate_timerange(config: &dyn ConfigPort) -> Result<(), SectraderError> {
    let Some(raw) = config.get_trimmed("backtest", "timerange") else {
        return Ok(());
    };
    raw.parse::<Timerange>()
        .map(|_| ())
        .map_err(|e| SectraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "timerange".to_string(),
            reason: e.to_string(),
        })
}

fn validate_mpc(config: &dyn ConfigPort) -> Result<(), SectraderError> {
    LocalRuntimeConfig::from_config(config).validate()
}

fn validate_logging(config: &dyn ConfigPort) -> Result<(), SectraderError> {
    let Some(level) = config.get_trimmed("logging", "level") else {
        return Ok(());
    };
    if LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        Ok(())
    } else {
        Err(SectraderError::ConfigInvalid {
            section: "logging".to_string(),
            key: "level".to_string(),
            reason: format!("unknown level '{level}' (expected one of {LOG_LEVELS:?})"),
        })
    }
}
