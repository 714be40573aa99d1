//! Summary statistics over closed trades.

use super::position::Trade;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub trade_count: usize,
    /// Fraction of trades with a strictly positive profit, 0..=1.
    pub win_rate: f64,
    /// Sum of per-trade profit percentages (not compounded).
    pub total_return_pct: f64,
    pub average_profit_pct: f64,
}

impl Statistics {
    pub fn compute(trades: &[Trade]) -> Self {
        let trade_count = trades.len();
        if trade_count == 0 {
            return Statistics::default();
        }

        let wins = trades.iter().filter(|t| t.is_win()).count();
        let total_return_pct: f64 = trades.iter().map(|t| t.profit_pct).sum();

        Statistics {
            trade_count,
            win_rate: wins as f64 / trade_count as f64,
            total_return_pct,
            average_profit_pct: total_return_pct / trade_count as f64,
        }
    }
}
