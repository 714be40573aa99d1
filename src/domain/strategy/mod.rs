//! Strategy contract and signal generation.
//!
//! A strategy turns secret close/volume series into secret entry/exit bits,
//! one per time step. Indices before [`Strategy::warmup_period`] must be
//! `false` for both. Signal composition uses the session's secret AND/OR so
//! every party issues the same operations whatever the data.

pub mod advanced;
pub mod sma_dip;

pub use advanced::{AdvancedParams, AdvancedStrategy};
pub use sma_dip::SmaDipStrategy;

use crate::domain::error::SectraderError;
use crate::domain::indicator::{
    IndicatorType, MacdSeries, calculate_ema, calculate_macd, calculate_rsi, calculate_sma,
};
use crate::domain::secret::{SecretBool, SecretValue, SecureBoolSeries, SecureSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::secure_runtime_port::SecureSession;

/// Secret entry/exit bits aligned with the input series.
#[derive(Debug, Clone, Default)]
pub struct SignalSeries {
    pub entry: SecureBoolSeries,
    pub exit: SecureBoolSeries,
}

pub trait Strategy {
    fn name(&self) -> &str;

    /// Number of leading indices that always signal nothing.
    fn warmup_period(&self) -> usize;

    /// Indicators the strategy computes, for reporting.
    fn indicators(&self) -> Vec<IndicatorType>;

    fn generate_signals(
        &self,
        close: &[SecretValue],
        volume: &[SecretValue],
        session: &mut dyn SecureSession,
    ) -> Result<SignalSeries, SectraderError>;

    fn sma(
        &self,
        session: &mut dyn SecureSession,
        series: &[SecretValue],
        period: usize,
    ) -> Result<SecureSeries, SectraderError> {
        calculate_sma(session, series, period)
    }

    fn ema(
        &self,
        session: &mut dyn SecureSession,
        series: &[SecretValue],
        period: usize,
    ) -> Result<SecureSeries, SectraderError> {
        calculate_ema(session, series, period)
    }

    fn rsi(
        &self,
        session: &mut dyn SecureSession,
        series: &[SecretValue],
        period: usize,
    ) -> Result<SecureSeries, SectraderError> {
        calculate_rsi(session, series, period)
    }

    fn macd(
        &self,
        session: &mut dyn SecureSession,
        series: &[SecretValue],
        fast: usize,
        slow: usize,
        signal: usize,
    ) -> Result<MacdSeries, SectraderError> {
        calculate_macd(session, series, fast, slow, signal)
    }
}

/// Close and volume must be non-empty and of equal length.
pub fn check_inputs(close: &[SecretValue], volume: &[SecretValue]) -> Result<(), SectraderError> {
    if close.is_empty() {
        return Err(SectraderError::contract("input series are empty"));
    }
    if close.len() != volume.len() {
        return Err(SectraderError::contract(format!(
            "close has {} elements but volume has {}",
            close.len(),
            volume.len()
        )));
    }
    Ok(())
}

/// Build `len` entry/exit pairs: public `false` before `warmup`, `signal_at(i)`
/// from there on.
pub fn signals_after_warmup<F>(
    session: &mut dyn SecureSession,
    len: usize,
    warmup: usize,
    mut signal_at: F,
) -> Result<SignalSeries, SectraderError>
where
    F: FnMut(&mut dyn SecureSession, usize) -> Result<(SecretBool, SecretBool), SectraderError>,
{
    let mut signals = SignalSeries {
        entry: Vec::with_capacity(len),
        exit: Vec::with_capacity(len),
    };
    for i in 0..len {
        let (entry, exit) = if i < warmup {
            (session.bit(false)?, session.bit(false)?)
        } else {
            signal_at(session, i)?
        };
        signals.entry.push(entry);
        signals.exit.push(exit);
    }
    Ok(signals)
}

/// Build the strategy named in `[strategy] name`.
pub fn strategy_from_config(config: &dyn ConfigPort) -> Result<Box<dyn Strategy>, SectraderError> {
    let name = config
        .get_string("strategy", "name")
        .unwrap_or_else(|| sma_dip::NAME.to_string());
    match name.trim() {
        sma_dip::NAME => Ok(Box::new(SmaDipStrategy::from_config(config)?)),
        advanced::NAME => Ok(Box::new(AdvancedStrategy::from_config(config)?)),
        other => Err(SectraderError::ConfigInvalid {
            section: "strategy".into(),
            key: "name".into(),
            reason: format!(
                "unknown strategy '{other}' (expected {} or {})",
                sma_dip::NAME,
                advanced::NAME
            ),
        }),
    }
}

/// Read a positive period from `[strategy]`.
pub(crate) fn period_from_config(
    config: &dyn ConfigPort,
    key: &str,
    default: usize,
) -> Result<usize, SectraderError> {
    let value = config.get_int("strategy", key, default as i64);
    if value < 1 {
        return Err(SectraderError::ConfigInvalid {
            section: "strategy".into(),
            key: key.into(),
            reason: "period must be at least 1".into(),
        });
    }
    Ok(value as usize)
}
