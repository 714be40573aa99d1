//! Domain error types.

use crate::domain::indicator::IndicatorType;

/// Top-level error type for sectrader.
#[derive(Debug, thiserror::Error)]
pub enum SectraderError {
    #[error("no market data for {pair} ({timeframe}): {reason}")]
    DataUnavailable {
        pair: String,
        timeframe: String,
        reason: String,
    },

    #[error("secure computation failed: {reason}")]
    Protocol { reason: String },

    #[error("strategy contract violated: {reason}")]
    StrategyContractViolation { reason: String },

    #[error("invalid indicator {indicator}: {reason}")]
    InvalidIndicator {
        indicator: IndicatorType,
        reason: String,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SectraderError {
    pub(crate) fn protocol(reason: impl Into<String>) -> Self {
        SectraderError::Protocol {
            reason: reason.into(),
        }
    }

    pub(crate) fn contract(reason: impl Into<String>) -> Self {
        SectraderError::StrategyContractViolation {
            reason: reason.into(),
        }
    }

    /// Process exit status reported by the CLI for this error.
    pub fn exit_status(&self) -> u8 {
        match self {
            SectraderError::Io(_) | SectraderError::Serialization(_) => 1,
            SectraderError::ConfigParse { .. }
            | SectraderError::ConfigMissing { .. }
            | SectraderError::ConfigInvalid { .. } => 2,
            SectraderError::Protocol { .. } => 3,
            SectraderError::StrategyContractViolation { .. }
            | SectraderError::InvalidIndicator { .. } => 4,
            SectraderError::DataUnavailable { .. } => 5,
        }
    }
}

impl From<&SectraderError> for std::process::ExitCode {
    fn from(err: &SectraderError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
