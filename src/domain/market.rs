//! Plaintext market rows and the requested time range.

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

/// One candle as supplied by the market data provider.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketRow {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub volume: f64,
}

/// Half-open date range `[start, end)` in `YYYYMMDD-YYYYMMDD` form.
///
/// Either side may be omitted: `20240101-` runs to the end of the data,
/// `-20240301` starts at the beginning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timerange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Timerange {
    pub const UNBOUNDED: Timerange = Timerange {
        start: None,
        end: None,
    };

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        let date = timestamp.date();
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date < end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timerange '{input}': {reason}")]
pub struct TimerangeParseError {
    pub input: String,
    pub reason: String,
}

impl FromStr for Timerange {
    type Err = TimerangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason: &str| TimerangeParseError {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Timerange::UNBOUNDED);
        }

        let (start_str, end_str) = trimmed
            .split_once('-')
            .ok_or_else(|| fail("expected START-END"))?;

        let parse_side = |side: &str| -> Result<Option<NaiveDate>, TimerangeParseError> {
            if side.is_empty() {
                return Ok(None);
            }
            NaiveDate::parse_from_str(side, "%Y%m%d")
                .map(Some)
                .map_err(|_| fail("dates must be YYYYMMDD"))
        };

        let range = Timerange {
            start: parse_side(start_str)?,
            end: parse_side(end_str)?,
        };

        if let (Some(start), Some(end)) = (range.start, range.end) {
            if start >= end {
                return Err(fail("start must be before end"));
            }
        }
        Ok(range)
    }
}

impl fmt::Display for Timerange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{}", start.format("%Y%m%d"))?;
        }
        write!(f, "-")?;
        if let Some(end) = self.end {
            write!(f, "{}", end.format("%Y%m%d"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn parse_closed_range() {
        let range: Timerange = "20240101-20240301".parse().unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(range.to_string(), "20240101-20240301");
    }

    #[test]
    fn parse_open_sides() {
        let from: Timerange = "20240101-".parse().unwrap();
        assert!(from.end.is_none());
        let until: Timerange = "-20240301".parse().unwrap();
        assert!(until.start.is_none());
        assert_eq!("".parse::<Timerange>().unwrap(), Timerange::UNBOUNDED);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("2024".parse::<Timerange>().is_err());
        assert!("2024-01-01".parse::<Timerange>().is_err());
        assert!("20240301-20240101".parse::<Timerange>().is_err());
    }

    #[test]
    fn contains_is_start_inclusive_end_exclusive() {
        let range: Timerange = "20240102-20240104".parse().unwrap();
        assert!(!range.contains(at(2024, 1, 1)));
        assert!(range.contains(at(2024, 1, 2)));
        assert!(range.contains(at(2024, 1, 3)));
        assert!(!range.contains(at(2024, 1, 4)));
    }

    #[test]
    fn unbounded_contains_everything() {
        assert!(Timerange::UNBOUNDED.contains(at(1999, 12, 31)));
        assert!(Timerange::UNBOUNDED.contains(at(2099, 1, 1)));
    }
}
