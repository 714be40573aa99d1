//! Relative Strength Index over a secret series.
//!
//! gains[j] = max(S[j+1] - S[j], 0), losses[j] = max(S[j] - S[j+1], 0) for the
//! n-1 consecutive changes, each padded with one trailing zero so the averages
//! line up with the n input elements. Averages use [`calculate_sma`] including
//! its pass-through warm-up.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss), and RSI = 100 where
//! avg_loss == 0. The zero test is a secret bit: both outcomes are computed
//! and `select` picks one, with the divisor swapped for 1 where it is zero.

use crate::domain::error::SectraderError;
use crate::domain::indicator::{IndicatorType, calculate_sma};
use crate::domain::secret::{SecretValue, SecureSeries};
use crate::ports::secure_runtime_port::SecureSession;

pub const RSI_MAX: f64 = 100.0;

pub fn calculate_rsi(
    session: &mut dyn SecureSession,
    series: &[SecretValue],
    period: usize,
) -> Result<SecureSeries, SectraderError> {
    IndicatorType::Rsi(period).validate()?;

    if series.is_empty() {
        return Ok(Vec::new());
    }

    let zero = session.constant(0.0)?;
    let one = session.constant(1.0)?;
    let hundred = session.constant(RSI_MAX)?;

    let mut gains = Vec::with_capacity(series.len());
    let mut losses = Vec::with_capacity(series.len());
    for pair in series.windows(2) {
        let change = session.sub(pair[1], pair[0])?;
        let drop = session.sub(pair[0], pair[1])?;
        gains.push(session.max(change, zero)?);
        losses.push(session.max(drop, zero)?);
    }
    gains.push(zero);
    losses.push(zero);

    let avg_gain = calculate_sma(session, &gains, period)?;
    let avg_loss = calculate_sma(session, &losses, period)?;

    let mut values = Vec::with_capacity(series.len());
    for (&gain, &loss) in avg_gain.iter().zip(&avg_loss) {
        let no_loss = session.eq(loss, zero)?;
        let divisor = session.select(no_loss, one, loss)?;
        let rs = session.div(gain, divisor)?;
        let denominator = session.add(one, rs)?;
        let damped = session.div(hundred, denominator)?;
        let rsi = session.sub(hundred, damped)?;
        values.push(session.select(no_loss, hundred, rsi)?);
    }
    Ok(values)
}
