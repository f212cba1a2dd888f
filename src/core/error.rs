use std::time::Duration;

use thiserror::Error;

/// Failures reported by a [`crate::ledger::Ledger`] implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("ledger operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("ledger lock poisoned")]
    Poisoned,
}

#[derive(Error, Debug)]
pub enum RespecError {
    /// The triggering event was not applied.
    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(#[from] LedgerError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Worker task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, RespecError>;
