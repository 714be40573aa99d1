//! Port traits for the collaborators the engine consumes.

pub mod config_port;
pub mod data_port;
pub mod report_port;
pub mod secure_runtime_port;
