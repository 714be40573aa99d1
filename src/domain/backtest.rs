//! Secure backtest orchestration.
//!
//! Loads plaintext rows, shares them inside a secure session, runs the
//! strategy, reveals only the entry/exit bits, then simulates trades on the
//! plaintext prices. The session is released on every exit path.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::error::SectraderError;
use crate::domain::market::{MarketRow, Timerange};
use crate::domain::metrics::Statistics;
use crate::domain::position::Trade;
use crate::domain::simulator::{RevealedSignals, simulate};
use crate::domain::strategy::Strategy;
use crate::ports::data_port::MarketDataPort;
use crate::ports::secure_runtime_port::{SecureRuntime, SecureSession};

/// What to backtest.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub pair: String,
    pub timeframe: String,
    pub timerange: Timerange,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub statistics: Statistics,
}

/// Owns a session for one run; shuts it down when dropped unless
/// [`SessionGuard::finish`] already did.
pub struct SessionGuard<S: SecureSession> {
    session: S,
    finished: bool,
}

impl<S: SecureSession> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            finished: false,
        }
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Shut down now and report the outcome.
    pub fn finish(mut self) -> Result<(), SectraderError> {
        self.finished = true;
        self.session.shutdown()
    }
}

impl<S: SecureSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.session.shutdown() {
            tracing::warn!(session = %self.session.id(), error = %e, "session shutdown failed");
        }
    }
}

pub struct SecureBacktester<'a, R: SecureRuntime> {
    data_port: &'a dyn MarketDataPort,
    runtime: &'a R,
}

impl<'a, R: SecureRuntime> SecureBacktester<'a, R> {
    pub fn new(data_port: &'a dyn MarketDataPort, runtime: &'a R) -> Self {
        Self { data_port, runtime }
    }

    pub fn run(
        &self,
        pair: &str,
        timeframe: &str,
        timerange: &Timerange,
        strategy: &dyn Strategy,
    ) -> Result<BacktestResult, SectraderError> {
        let rows = self.data_port.load(pair, timeframe, timerange)?;
        if rows.is_empty() {
            return Err(SectraderError::DataUnavailable {
                pair: pair.to_string(),
                timeframe: timeframe.to_string(),
                reason: format!("no rows in {timerange}"),
            });
        }

        tracing::info!(
            pair,
            timeframe,
            rows = rows.len(),
            strategy = strategy.name(),
            "starting secure backtest"
        );

        let mut guard = SessionGuard::new(self.runtime.start()?);
        let revealed = compute_signals(guard.session_mut(), &rows, strategy);
        let shutdown = guard.finish();
        let signals = revealed?;
        shutdown?;

        check_warmup(&signals, strategy.warmup_period())?;

        let outcome = simulate(&rows, &signals);
        if let Some(open) = &outcome.open_position {
            tracing::info!(
                entry_time = %open.entry_time,
                entry_price = open.entry_price,
                "position still open at end of data; not counted"
            );
        }

        let statistics = Statistics::compute(&outcome.trades);
        tracing::info!(
            trades = statistics.trade_count,
            total_return_pct = statistics.total_return_pct,
            "backtest finished"
        );

        Ok(BacktestResult {
            trades: outcome.trades,
            statistics,
        })
    }
}

/// Run one backtest with a fresh orchestrator.
pub fn run_backtest<R: SecureRuntime>(
    data_port: &dyn MarketDataPort,
    runtime: &R,
    pair: &str,
    timeframe: &str,
    timerange: &Timerange,
    strategy: &dyn Strategy,
) -> Result<BacktestResult, SectraderError> {
    SecureBacktester::new(data_port, runtime).run(pair, timeframe, timerange, strategy)
}

/// Share the inputs, generate signals and reveal them. Reveals happen only
/// after the strategy has finished: all entry bits in order, then all exits.
pub fn compute_signals(
    session: &mut dyn SecureSession,
    rows: &[MarketRow],
    strategy: &dyn Strategy,
) -> Result<RevealedSignals, SectraderError> {
    let close = rows
        .iter()
        .map(|row| session.share(row.close))
        .collect::<Result<Vec<_>, _>>()?;
    let volume = rows
        .iter()
        .map(|row| session.share(row.volume))
        .collect::<Result<Vec<_>, _>>()?;

    let signals = strategy.generate_signals(&close, &volume, session)?;

    for (label, len) in [("entry", signals.entry.len()), ("exit", signals.exit.len())] {
        if len != rows.len() {
            return Err(SectraderError::contract(format!(
                "{label} series has {len} elements for {} rows",
                rows.len()
            )));
        }
    }

    let entry = signals
        .entry
        .iter()
        .map(|bit| session.reveal_bool(*bit))
        .collect::<Result<Vec<_>, _>>()?;
    let exit = signals
        .exit
        .iter()
        .map(|bit| session.reveal_bool(*bit))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        entries = entry.iter().filter(|b| **b).count(),
        exits = exit.iter().filter(|b| **b).count(),
        "signals revealed"
    );
    Ok(RevealedSignals { entry, exit })
}

/// Every index before `warmup` must be `false` for both signals.
pub fn check_warmup(signals: &RevealedSignals, warmup: usize) -> Result<(), SectraderError> {
    let steps = signals.entry.iter().zip(&signals.exit).take(warmup);
    for (i, (&entry, &exit)) in steps.enumerate() {
        if entry || exit {
            return Err(SectraderError::contract(format!(
                "signal at index {i} inside the {warmup}-row warm-up"
            )));
        }
    }
    Ok(())
}
