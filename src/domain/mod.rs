//! Core domain types and logic.

pub mod market;
pub mod secret;
pub mod position;
pub mod indicator;
pub mod strategy;
pub mod simulator;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
