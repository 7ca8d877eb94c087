//! Job descriptors and run outcomes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One external solver invocation. Immutable once planned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobDescriptor {
    /// Shell command line, run through `sh -c`.
    pub invocation: String,

    /// Where standard output is captured.
    pub stdout_path: PathBuf,

    /// Where standard error is captured.
    pub stderr_path: PathBuf,

    /// Wall-clock budget before the run is terminated.
    pub deadline: Duration,
}

impl JobDescriptor {
    pub fn new(
        invocation: impl Into<String>,
        stdout_path: impl Into<PathBuf>,
        stderr_path: impl Into<PathBuf>,
        deadline: Duration,
    ) -> Self {
        Self {
            invocation: invocation.into(),
            stdout_path: stdout_path.into(),
            stderr_path: stderr_path.into(),
            deadline,
        }
    }

    pub fn deadline_ms(&self) -> u64 {
        self.deadline.as_millis() as u64
    }
}

/// How a supervised run ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The process exited on its own within the deadline.
    Completed { exit_code: i32 },

    /// The deadline expired and the process group was terminated.
    TimedOut,

    /// The process died from a signal, or could not be spawned or
    /// supervised (`signal` is `None` then).
    Crashed { signal: Option<i32> },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, RunOutcome::TimedOut)
    }

    pub fn is_crashed(&self) -> bool {
        matches!(self, RunOutcome::Crashed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            RunOutcome::Completed { .. } => "completed",
            RunOutcome::TimedOut => "timed_out",
            RunOutcome::Crashed { .. } => "crashed",
        }
    }
}
