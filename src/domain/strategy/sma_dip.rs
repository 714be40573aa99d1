//! Mean-reversion on a single moving average: enter when the close dips
//! below SMA(window), exit when it rises above it.

use crate::domain::error::SectraderError;
use crate::domain::indicator::IndicatorType;
use crate::domain::secret::SecretValue;
use crate::domain::strategy::{
    SignalSeries, Strategy, check_inputs, period_from_config, signals_after_warmup,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::secure_runtime_port::SecureSession;

pub const NAME: &str = "sma_dip";
pub const DEFAULT_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmaDipStrategy {
    pub window: usize,
}

impl Default for SmaDipStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl SmaDipStrategy {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SectraderError> {
        Ok(Self::new(period_from_config(config, "window", DEFAULT_WINDOW)?))
    }
}

impl Strategy for SmaDipStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn warmup_period(&self) -> usize {
        self.window
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        vec![IndicatorType::Sma(self.window)]
    }

    fn generate_signals(
        &self,
        close: &[SecretValue],
        volume: &[SecretValue],
        session: &mut dyn SecureSession,
    ) -> Result<SignalSeries, SectraderError> {
        check_inputs(close, volume)?;
        let sma = self.sma(session, close, self.window)?;

        signals_after_warmup(session, close.len(), self.window, |session, i| {
            let entry = session.lt(close[i], sma[i])?;
            let exit = session.gt(close[i], sma[i])?;
            Ok((entry, exit))
        })
    }
}
