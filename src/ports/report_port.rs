//! Result output port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SectraderError;
use std::path::Path;

/// Port for persisting a finished backtest.
pub trait ResultPort {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), SectraderError>;
}
