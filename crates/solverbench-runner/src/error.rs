//! Error types for the runner crate.
//!
//! Per-job failures never surface here; they become [`RunOutcome`]s.
//! These errors cover setting up a batch and persisting its ledger.
//!
//! [`RunOutcome`]: crate::job::RunOutcome

/// Errors produced by the runner layer.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("concurrency must be at least 1, got {0}")]
    InvalidConcurrency(usize),

    #[error("invalid campaign: {0}")]
    InvalidCampaign(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for runner operations.
pub type RunnerResult<T> = std::result::Result<T, RunnerError>;
