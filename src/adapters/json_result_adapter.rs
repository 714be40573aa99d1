//! JSON result adapter implementing ResultPort.
//!
//! Writes the trade list and statistics as pretty-printed JSON. Field order
//! follows the struct definitions, so identical results give identical bytes.

use std::fs;
use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SectraderError;
use crate::ports::report_port::ResultPort;

#[derive(Debug, Default)]
pub struct JsonResultAdapter;

impl JsonResultAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(result: &BacktestResult) -> Result<String, SectraderError> {
        let mut json = serde_json::to_string_pretty(result)?;
        json.push('\n');
        Ok(json)
    }
}

impl ResultPort for JsonResultAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), SectraderError> {
        let json = Self::render(result)?;
        if let Some(dir) = output_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(output_path, json)?;
        tracing::info!(path = %output_path.display(), "result written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::Statistics;
    use crate::domain::position::Trade;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_result() -> BacktestResult {
        let at = |h| {
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap()
        };
        let trades = vec![Trade {
            entry_price: 90.0,
            entry_time: at(1),
            exit_price: 99.0,
            exit_time: at(2),
            profit_pct: 10.0,
        }];
        let statistics = Statistics::compute(&trades);
        BacktestResult { trades, statistics }
    }

    #[test]
    fn render_contains_trades_and_statistics() {
        let json = JsonResultAdapter::render(&sample_result()).unwrap();
        assert!(json.contains("\"trades\""));
        assert!(json.contains("\"entry_time\": \"2024-03-01T01:00:00\""));
        assert!(json.contains("\"trade_count\": 1"));
        assert!(json.ends_with('\n'));
    }

    #[test]
    fn render_is_deterministic() {
        let a = JsonResultAdapter::render(&sample_result()).unwrap();
        let b = JsonResultAdapter::render(&sample_result()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn write_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("result.json");
        JsonResultAdapter::new().write(&sample_result(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let back: BacktestResult = serde_json::from_str(&content).unwrap();
        assert_eq!(back, sample_result());
    }
}
