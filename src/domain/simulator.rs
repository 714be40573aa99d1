//! Trade simulation over revealed signals.
//!
//! One pass over the rows with a single state variable: FLAT (no position) or
//! IN_POSITION. On a row where both signals are set, an open position exits
//! first; a flat book enters. Entry while in a position and exit while flat are
//! ignored. A position still open after the last row is dropped, not closed.

use crate::domain::market::MarketRow;
use crate::domain::position::{Position, Trade};

/// Plaintext entry/exit signals, one per market row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealedSignals {
    pub entry: Vec<bool>,
    pub exit: Vec<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationOutcome {
    pub trades: Vec<Trade>,
    /// Left open at the end of the series; excluded from statistics.
    pub open_position: Option<Position>,
}

/// Rows beyond the shorter signal series are not visited; callers check
/// lengths beforehand.
pub fn simulate(rows: &[MarketRow], signals: &RevealedSignals) -> SimulationOutcome {
    let mut trades = Vec::new();
    let mut position: Option<Position> = None;

    let steps = rows.iter().zip(signals.entry.iter().zip(&signals.exit));
    for (row, (&entry, &exit)) in steps {
        position = match position.take() {
            Some(open) if exit => {
                let trade = open.close(row.close, row.timestamp);
                tracing::debug!(
                    entry_time = %trade.entry_time,
                    exit_time = %trade.exit_time,
                    profit_pct = trade.profit_pct,
                    "trade closed"
                );
                trades.push(trade);
                None
            }
            Some(open) => Some(open),
            None if entry => Some(Position {
                entry_price: row.close,
                entry_time: row.timestamp,
            }),
            None => None,
        };
    }

    SimulationOutcome {
        trades,
        open_position: position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + chrono::Duration::minutes(5 * i as i64)
    }

    fn rows(prices: &[f64]) -> Vec<MarketRow> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| MarketRow {
                timestamp: at(i),
                close,
                volume: 1000.0,
            })
            .collect()
    }

    fn signals(entry: &[u8], exit: &[u8]) -> RevealedSignals {
        RevealedSignals {
            entry: entry.iter().map(|b| *b == 1).collect(),
            exit: exit.iter().map(|b| *b == 1).collect(),
        }
    }

    #[test]
    fn single_round_trip() {
        let r = rows(&[100.0, 90.0, 99.0]);
        let out = simulate(&r, &signals(&[0, 1, 0], &[0, 0, 1]));
        assert_eq!(out.trades.len(), 1);
        let t = &out.trades[0];
        assert_eq!(t.entry_price, 90.0);
        assert_eq!(t.exit_price, 99.0);
        assert_eq!(t.entry_time, at(1));
        assert_eq!(t.exit_time, at(2));
        assert!((t.profit_pct - 10.0).abs() < 1e-12);
        assert!(out.open_position.is_none());
    }

    #[test]
    fn no_pyramiding() {
        let r = rows(&[10.0, 20.0, 30.0, 40.0]);
        let out = simulate(&r, &signals(&[1, 1, 1, 0], &[0, 0, 0, 1]));
        assert_eq!(out.trades.len(), 1);
        assert_eq!(out.trades[0].entry_price, 10.0);
        assert_eq!(out.trades[0].exit_price, 40.0);
    }

    #[test]
    fn exit_while_flat_is_ignored() {
        let r = rows(&[10.0, 20.0, 30.0]);
        let out = simulate(&r, &signals(&[0, 0, 0], &[1, 1, 1]));
        assert!(out.trades.is_empty());
        assert!(out.open_position.is_none());
    }

    #[test]
    fn both_signals_while_flat_enters() {
        let r = rows(&[10.0, 20.0, 30.0]);
        let out = simulate(&r, &signals(&[1, 0, 0], &[1, 0, 1]));
        assert_eq!(out.trades.len(), 1);
        assert_eq!(out.trades[0].entry_time, at(0));
        assert_eq!(out.trades[0].exit_time, at(2));
    }

    #[test]
    fn both_signals_while_in_position_exits_without_reentry() {
        let r = rows(&[10.0, 20.0, 30.0, 40.0]);
        let out = simulate(&r, &signals(&[1, 1, 0, 0], &[0, 1, 0, 0]));
        assert_eq!(out.trades.len(), 1);
        assert_eq!(out.trades[0].exit_time, at(1));
        assert!(out.open_position.is_none(), "entry on the exit row is ignored");
    }

    #[test]
    fn open_position_at_end_is_not_a_trade() {
        let r = rows(&[10.0, 20.0, 30.0]);
        let out = simulate(&r, &signals(&[0, 1, 0], &[0, 0, 0]));
        assert!(out.trades.is_empty());
        assert_eq!(
            out.open_position,
            Some(Position {
                entry_price: 20.0,
                entry_time: at(1)
            })
        );
    }

    #[test]
    fn multiple_trades_in_order() {
        let r = rows(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let out = simulate(&r, &signals(&[1, 0, 1, 0, 0, 0], &[0, 1, 0, 0, 1, 0]));
        assert_eq!(out.trades.len(), 2);
        assert!(out.trades[0].exit_time <= out.trades[1].entry_time);
    }

    #[test]
    fn empty_input() {
        let out = simulate(&[], &RevealedSignals::default());
        assert!(out.trades.is_empty());
        assert!(out.open_position.is_none());
    }
}
