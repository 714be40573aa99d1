//! MACD (Moving Average Convergence Divergence) over a secret series.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9

use crate::domain::error::SectraderError;
use crate::domain::indicator::{IndicatorType, calculate_ema};
use crate::domain::secret::{SecretValue, SecureSeries};
use crate::ports::secure_runtime_port::SecureSession;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub line: SecureSeries,
    pub signal: SecureSeries,
    pub histogram: SecureSeries,
}

pub fn calculate_macd(
    session: &mut dyn SecureSession,
    series: &[SecretValue],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Result<MacdSeries, SectraderError> {
    IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    }
    .validate()?;

    let fast_ema = calculate_ema(session, series, fast)?;
    let slow_ema = calculate_ema(session, series, slow)?;

    let line = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(&f, &s)| session.sub(f, s))
        .collect::<Result<SecureSeries, _>>()?;
    let signal = calculate_ema(session, &line, signal_period)?;
    let histogram = line
        .iter()
        .zip(&signal)
        .map(|(&m, &s)| session.sub(m, s))
        .collect::<Result<SecureSeries, _>>()?;

    Ok(MacdSeries {
        line,
        signal,
        histogram,
    })
}
