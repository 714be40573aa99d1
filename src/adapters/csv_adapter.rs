//! CSV file market data adapter.
//!
//! One file per pair and timeframe, `<PAIR>-<timeframe>.csv` with `/` in the
//! pair replaced by `_`, e.g. `BTC_USDT-5m.csv`. Columns are located by header
//! name so extra columns (open, high, low, ...) are ignored.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::path::{Path, PathBuf};

use crate::domain::error::SectraderError;
use crate::domain::market::{MarketRow, Timerange};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvAdapter {
    datadir: PathBuf,
}

impl CsvAdapter {
    pub fn new(datadir: PathBuf) -> Self {
        Self { datadir }
    }

    /// Read `[data] datadir`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SectraderError> {
        let datadir = config
            .get_trimmed("data", "datadir")
            .ok_or_else(|| SectraderError::ConfigMissing {
                section: "data".into(),
                key: "datadir".into(),
            })?;
        Ok(Self::new(PathBuf::from(datadir)))
    }

    pub fn datadir(&self) -> &Path {
        &self.datadir
    }

    pub fn csv_path(&self, pair: &str, timeframe: &str) -> PathBuf {
        self.datadir
            .join(format!("{}-{}.csv", pair.replace('/', "_"), timeframe))
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

impl MarketDataPort for CsvAdapter {
    fn load(
        &self,
        pair: &str,
        timeframe: &str,
        timerange: &Timerange,
    ) -> Result<Vec<MarketRow>, SectraderError> {
        let unavailable = |reason: String| SectraderError::DataUnavailable {
            pair: pair.to_string(),
            timeframe: timeframe.to_string(),
            reason,
        };

        let path = self.csv_path(pair, timeframe);
        let mut rdr = csv::Reader::from_path(&path)
            .map_err(|e| unavailable(format!("failed to read {}: {}", path.display(), e)))?;

        let headers = rdr
            .headers()
            .map_err(|e| unavailable(format!("CSV header error: {e}")))?
            .clone();
        let ts_col = column(&headers, &["timestamp", "date"])
            .ok_or_else(|| unavailable("missing timestamp column".into()))?;
        let close_col =
            column(&headers, &["close"]).ok_or_else(|| unavailable("missing close column".into()))?;
        let volume_col = column(&headers, &["volume"])
            .ok_or_else(|| unavailable("missing volume column".into()))?;

        let mut rows = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            // header is line 1
            let line = line + 2;
            let record = result.map_err(|e| unavailable(format!("CSV parse error: {e}")))?;

            let field = |idx: usize, name: &str| {
                record
                    .get(idx)
                    .ok_or_else(|| unavailable(format!("line {line}: missing {name} value")))
            };

            let raw_ts = field(ts_col, "timestamp")?;
            let timestamp = parse_timestamp(raw_ts)
                .ok_or_else(|| unavailable(format!("line {line}: invalid timestamp '{raw_ts}'")))?;
            if !timerange.contains(timestamp) {
                continue;
            }

            let close: f64 = field(close_col, "close")?
                .trim()
                .parse()
                .map_err(|e| unavailable(format!("line {line}: invalid close value: {e}")))?;
            if !close.is_finite() || close <= 0.0 {
                return Err(unavailable(format!(
                    "line {line}: close must be a positive number"
                )));
            }

            let volume: f64 = field(volume_col, "volume")?
                .trim()
                .parse()
                .map_err(|e| unavailable(format!("line {line}: invalid volume value: {e}")))?;
            if !volume.is_finite() || volume < 0.0 {
                return Err(unavailable(format!(
                    "line {line}: volume must be a non-negative number"
                )));
            }

            rows.push(MarketRow {
                timestamp,
                close,
                volume,
            });
        }

        rows.sort_by_key(|r| r.timestamp);
        if let Some(dup) = rows.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
            return Err(unavailable(format!("duplicate timestamp {}", dup[0].timestamp)));
        }
        if rows.is_empty() {
            return Err(unavailable(format!("no rows in {timerange}")));
        }

        tracing::debug!(
            path = %path.display(),
            rows = rows.len(),
            "market data loaded"
        );
        Ok(rows)
    }
}
