//! Simple Moving Average over a secret series.
//!
//! For i < n the input passes through unchanged. For i >= n,
//! SMA[i] = (S[i-n] + ... + S[i-1]) / n; the window ends just before the
//! current element. The divisor is public, so no secret division is needed.

use crate::domain::error::SectraderError;
use crate::domain::indicator::IndicatorType;
use crate::domain::secret::{SecretValue, SecureSeries};
use crate::ports::secure_runtime_port::SecureSession;

pub fn calculate_sma(
    session: &mut dyn SecureSession,
    series: &[SecretValue],
    period: usize,
) -> Result<SecureSeries, SectraderError> {
    IndicatorType::Sma(period).validate()?;

    let mut values = Vec::with_capacity(series.len());
    for i in 0..series.len() {
        if i < period {
            values.push(series[i]);
            continue;
        }
        let window_sum = session.sum(&series[i - period..i])?;
        values.push(session.div_public(window_sum, period as f64)?);
    }
    Ok(values)
}
