//! Trend/momentum/volume confluence strategy.
//!
//! Entry when all of: short SMA above long SMA, RSI oversold, MACD above its
//! signal line, volume above `volume_factor` times its own SMA.
//! Exit when any of: short SMA below long SMA, RSI overbought, MACD below its
//! signal line.

use crate::domain::error::SectraderError;
use crate::domain::indicator::IndicatorType;
use crate::domain::secret::SecretValue;
use crate::domain::strategy::{
    SignalSeries, Strategy, check_inputs, period_from_config, signals_after_warmup,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::secure_runtime_port::SecureSession;

pub const NAME: &str = "advanced";

#[derive(Debug, Clone, PartialEq)]
pub struct AdvancedParams {
    pub sma_short: usize,
    pub sma_long: usize,
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub volume_ma: usize,
    pub volume_factor: f64,
}

impl Default for AdvancedParams {
    fn default() -> Self {
        AdvancedParams {
            sma_short: 20,
            sma_long: 50,
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            volume_ma: 20,
            volume_factor: 2.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvancedStrategy {
    pub params: AdvancedParams,
}

impl AdvancedStrategy {
    pub fn new(params: AdvancedParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SectraderError> {
        let d = AdvancedParams::default();
        let params = AdvancedParams {
            sma_short: period_from_config(config, "sma_short", d.sma_short)?,
            sma_long: period_from_config(config, "sma_long", d.sma_long)?,
            rsi_period: period_from_config(config, "rsi_period", d.rsi_period)?,
            rsi_oversold: config.get_double("strategy", "rsi_oversold", d.rsi_oversold),
            rsi_overbought: config.get_double("strategy", "rsi_overbought", d.rsi_overbought),
            macd_fast: period_from_config(config, "macd_fast", d.macd_fast)?,
            macd_slow: period_from_config(config, "macd_slow", d.macd_slow)?,
            macd_signal: period_from_config(config, "macd_signal", d.macd_signal)?,
            volume_ma: period_from_config(config, "volume_ma", d.volume_ma)?,
            volume_factor: config.get_double("strategy", "volume_factor", d.volume_factor),
        };

        for (key, value) in [
            ("rsi_oversold", params.rsi_oversold),
            ("rsi_overbought", params.rsi_overbought),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(SectraderError::ConfigInvalid {
                    section: "strategy".into(),
                    key: key.into(),
                    reason: "RSI thresholds must be between 0 and 100".into(),
                });
            }
        }
        if !params.volume_factor.is_finite() || params.volume_factor < 0.0 {
            return Err(SectraderError::ConfigInvalid {
                section: "strategy".into(),
                key: "volume_factor".into(),
                reason: "volume_factor must be non-negative".into(),
            });
        }
        Ok(Self::new(params))
    }
}

impl Strategy for AdvancedStrategy {
    fn name(&self) -> &str {
        NAME
    }

    /// MACD's slow EMA governs the warm-up; the long SMA may still be in its
    /// pass-through region past this point.
    fn warmup_period(&self) -> usize {
        self.params.macd_slow
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        let p = &self.params;
        vec![
            IndicatorType::Sma(p.sma_short),
            IndicatorType::Sma(p.sma_long),
            IndicatorType::Rsi(p.rsi_period),
            IndicatorType::Macd {
                fast: p.macd_fast,
                slow: p.macd_slow,
                signal: p.macd_signal,
            },
            IndicatorType::Sma(p.volume_ma),
        ]
    }

    fn generate_signals(
        &self,
        close: &[SecretValue],
        volume: &[SecretValue],
        session: &mut dyn SecureSession,
    ) -> Result<SignalSeries, SectraderError> {
        check_inputs(close, volume)?;
        let p = &self.params;

        let sma_short = self.sma(session, close, p.sma_short)?;
        let sma_long = self.sma(session, close, p.sma_long)?;
        let rsi = self.rsi(session, close, p.rsi_period)?;
        let macd = self.macd(session, close, p.macd_fast, p.macd_slow, p.macd_signal)?;
        let volume_ma = self.sma(session, volume, p.volume_ma)?;

        let oversold = session.constant(p.rsi_oversold)?;
        let overbought = session.constant(p.rsi_overbought)?;

        signals_after_warmup(session, close.len(), self.warmup_period(), |s, i| {
            let trend_following = s.gt(sma_short[i], sma_long[i])?;
            let is_oversold = s.lt(rsi[i], oversold)?;
            let macd_cross = s.gt(macd.line[i], macd.signal[i])?;
            let volume_threshold = s.scale(volume_ma[i], p.volume_factor)?;
            let volume_confirm = s.gt(volume[i], volume_threshold)?;

            let entry = s.and(trend_following, is_oversold)?;
            let entry = s.and(entry, macd_cross)?;
            let entry = s.and(entry, volume_confirm)?;

            let trend_reversal = s.lt(sma_short[i], sma_long[i])?;
            let is_overbought = s.gt(rsi[i], overbought)?;
            let macd_exit = s.lt(macd.line[i], macd.signal[i])?;

            let exit = s.or(trend_reversal, is_overbought)?;
            let exit = s.or(exit, macd_exit)?;

            Ok((entry, exit))
        })
    }
}
