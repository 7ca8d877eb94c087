//! solverbench runner
//!
//! Executes planned solver runs as supervised child processes:
//!
//! - [`supervisor`]: one job, bounded by its deadline, process-group kill
//! - [`pool`]: bounded parallel execution of a job backlog
//! - [`ledger`]: per-batch bookkeeping and stderr cleanup
//! - [`plan`]: instance × configuration expansion into jobs

pub mod error;
pub mod job;
pub mod ledger;
pub mod plan;
pub mod pool;
pub mod supervisor;

pub use error::{RunnerError, RunnerResult};
pub use job::{JobDescriptor, RunOutcome};
pub use ledger::{LedgerEntry, LedgerSummary, RunLedger};
pub use plan::{shell_quote, Campaign, Configuration, PlannedJob, DEFAULT_DEADLINE_SLACK};
pub use pool::{LogProgress, ProgressObserver, WorkerPool};
pub use supervisor::{Supervisor, DEFAULT_GRACE};
