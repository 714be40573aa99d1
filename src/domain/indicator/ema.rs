//! Exponential Moving Average over a secret series.
//!
//! k = 2/(n+1), EMA[0] = S[0], EMA[i] = S[i]*k + EMA[i-1]*(1-k).
//! Each term depends on the previous secret output, so the chain is
//! evaluated strictly in order.

use crate::domain::error::SectraderError;
use crate::domain::indicator::IndicatorType;
use crate::domain::secret::{SecretValue, SecureSeries};
use crate::ports::secure_runtime_port::SecureSession;

pub fn calculate_ema(
    session: &mut dyn SecureSession,
    series: &[SecretValue],
    period: usize,
) -> Result<SecureSeries, SectraderError> {
    IndicatorType::Ema(period).validate()?;

    let Some((&first, rest)) = series.split_first() else {
        return Ok(Vec::new());
    };

    let k = smoothing_factor(period);
    let mut values = Vec::with_capacity(series.len());
    let mut ema = first;
    values.push(ema);

    for &value in rest {
        let weighted = session.scale(value, k)?;
        let carried = session.scale(ema, 1.0 - k)?;
        ema = session.add(weighted, carried)?;
        values.push(ema);
    }
    Ok(values)
}

pub fn smoothing_factor(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}
