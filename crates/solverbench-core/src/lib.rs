//! solverbench core library
//!
//! Turns captured solver output into canonical [`ResultRecord`]s and folds
//! them across configurations into comparative statistics.
//!
//! - [`extract`]: log extractor with versioned output [`dialect`]s
//! - [`aggregate`]: per-instance ranking, corpus rows, virtual best solver
//! - [`best_known`]: external best-known results table
//! - [`artifacts`]: log file naming shared with the runner

pub mod aggregate;
pub mod artifacts;
pub mod best_known;
pub mod dialect;
pub mod error;
pub mod extract;
pub mod obs;
pub mod record;
pub mod telemetry;

pub use aggregate::{
    aggregate, rank_instance, AggregateReport, AggregateRow, Aggregator, ConfigOutcome,
    CoverageMode, Diagnostic, Inclusion, InstanceFlags, InstanceRanking, EXTERNAL_LABEL,
    VBS_LABEL,
};
pub use artifacts::{error_log_path_for, instance_name, log_path_for};
pub use best_known::{BestKnownEntry, BestKnownTable};
pub use dialect::{Dialect, DialectKind, FieldLayout, TieRule};
pub use error::{BenchError, Result};
pub use extract::{extract, extract_instance, extract_str, parse_log, Terminal};
pub use obs::batch_span;
pub use record::{InstanceResultSet, Policy, ProofStatus, ResultRecord};
pub use telemetry::init_tracing;

/// solverbench version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
