#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use sectrader::domain::error::SectraderError;
pub use sectrader::domain::market::{MarketRow, Timerange};
use sectrader::domain::indicator::IndicatorType;
use sectrader::domain::secret::SecretValue;
use sectrader::domain::strategy::{SignalSeries, Strategy};
use sectrader::ports::data_port::MarketDataPort;
use sectrader::ports::secure_runtime_port::SecureSession;
use std::cell::Cell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<(String, String), Vec<MarketRow>>,
    pub loads: Cell<usize>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            loads: Cell::new(0),
        }
    }

    pub fn with_rows(mut self, pair: &str, timeframe: &str, rows: Vec<MarketRow>) -> Self {
        self.data
            .insert((pair.to_string(), timeframe.to_string()), rows);
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn load(
        &self,
        pair: &str,
        timeframe: &str,
        timerange: &Timerange,
    ) -> Result<Vec<MarketRow>, SectraderError> {
        self.loads.set(self.loads.get() + 1);
        let rows = self
            .data
            .get(&(pair.to_string(), timeframe.to_string()))
            .ok_or_else(|| SectraderError::DataUnavailable {
                pair: pair.to_string(),
                timeframe: timeframe.to_string(),
                reason: "not in mock".into(),
            })?;
        Ok(rows
            .iter()
            .filter(|r| timerange.contains(r.timestamp))
            .cloned()
            .collect())
    }
}

pub fn at(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::minutes(5 * i as i64)
}

pub fn make_rows(prices: &[f64]) -> Vec<MarketRow> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &close)| MarketRow {
            timestamp: at(i),
            close,
            volume: 1_000.0 + i as f64,
        })
        .collect()
}

/// Prices that dip under and recover over a 3-row SMA twice.
pub const DIP_PRICES: [f64; 8] = [100.0, 100.0, 100.0, 100.0, 90.0, 110.0, 90.0, 130.0];

/// Strategy that breaks its own contract in a configurable way.
pub enum BadStrategy {
    /// Returns one fewer signal than inputs.
    ShortSeries,
    /// Signals entry at index 0 despite a warm-up of 2.
    EarlySignal,
    /// Fails while computing.
    Fails,
}

impl Strategy for BadStrategy {
    fn name(&self) -> &str {
        "bad"
    }

    fn warmup_period(&self) -> usize {
        2
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        Vec::new()
    }

    fn generate_signals(
        &self,
        close: &[SecretValue],
        _volume: &[SecretValue],
        session: &mut dyn SecureSession,
    ) -> Result<SignalSeries, SectraderError> {
        let mut signals = SignalSeries::default();
        let len = match self {
            BadStrategy::ShortSeries => close.len() - 1,
            _ => close.len(),
        };
        if let BadStrategy::Fails = self {
            return Err(SectraderError::Protocol {
                reason: "boom".into(),
            });
        }
        for i in 0..len {
            let entry = matches!(self, BadStrategy::EarlySignal) && i == 0;
            signals.entry.push(session.bit(entry)?);
            signals.exit.push(session.bit(false)?);
        }
        Ok(signals)
    }
}
