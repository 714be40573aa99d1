//! Open position and closed trade records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A long position between a realized entry and its exit.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
}

impl Position {
    pub fn close(self, exit_price: f64, exit_time: NaiveDateTime) -> Trade {
        Trade {
            entry_price: self.entry_price,
            entry_time: self.entry_time,
            exit_price,
            exit_time,
            profit_pct: profit_pct(self.entry_price, exit_price),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_time: NaiveDateTime,
    pub profit_pct: f64,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.profit_pct > 0.0
    }
}

/// (exit - entry) / entry * 100
pub fn profit_pct(entry_price: f64, exit_price: f64) -> f64 {
    (exit_price - entry_price) / entry_price * 100.0
}
