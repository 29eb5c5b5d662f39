use std::io;

use thiserror::Error;

/// Problems detected while building or reconfiguring a simulation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("failed to read configuration file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry output failed: {0}")]
    Io(#[from] io::Error),
}
