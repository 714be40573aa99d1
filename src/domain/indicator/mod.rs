//! Technical indicators over secret-shared series.
//!
//! Every indicator takes a [`SecureSeries`](crate::domain::secret::SecureSeries)
//! and public periods and returns series of the same length, computed only
//! through [`SecureSession`] operations. No value is revealed along the way and
//! the sequence of operations depends only on the series length and periods,
//! never on the data.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::calculate_ema;
pub use macd::{MacdSeries, calculate_macd};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use crate::domain::error::SectraderError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl IndicatorType {
    /// Reject zero periods before any secure operation is issued.
    pub fn validate(&self) -> Result<(), SectraderError> {
        let has_zero = match self {
            IndicatorType::Sma(p) | IndicatorType::Ema(p) | IndicatorType::Rsi(p) => *p == 0,
            IndicatorType::Macd { fast, slow, signal } => [fast, slow, signal].contains(&&0),
        };
        if has_zero {
            return Err(SectraderError::InvalidIndicator {
                indicator: self.clone(),
                reason: "period must be at least 1".into(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}
