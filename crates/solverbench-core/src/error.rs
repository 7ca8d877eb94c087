//! Error taxonomy for log extraction, best-known tables and campaign files.
//!
//! Most of these never escape a report pass: the extractor degrades them to a
//! sentinel record. They exist so callers (and tests) can see *why* a log was
//! rejected.

use std::path::PathBuf;

/// Errors produced while reading benchmark artifacts.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("log has no solutions line")]
    NoSolutionLine,

    #[error("malformed solutions line for {dialect} dialect: {reason}")]
    MalformedLine { dialect: String, reason: String },

    #[error("best-known table line {line}: {reason}")]
    MalformedBestKnown { line: usize, reason: String },

    #[error("invalid campaign configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown dialect: {0}")]
    UnknownDialect(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for solverbench core operations.
pub type Result<T> = std::result::Result<T, BenchError>;
