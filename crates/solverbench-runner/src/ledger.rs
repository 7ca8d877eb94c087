//! Run ledger: per-batch bookkeeping after each supervised job.
//!
//! Finalizing a job removes its stderr artifact when it is empty and keeps
//! it otherwise. The ledger only records what happened; nothing here feeds
//! record extraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::RunnerResult;
use crate::job::{JobDescriptor, RunOutcome};

/// One finalized job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    pub invocation: String,
    pub outcome: RunOutcome,
    /// True when a non-empty stderr log was left in place.
    pub stderr_retained: bool,
    pub finished_at: DateTime<Utc>,
}

/// Outcome counts for one batch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSummary {
    pub total: usize,
    pub completed: usize,
    pub timed_out: usize,
    pub crashed: usize,
    pub stderr_retained: usize,
}

/// Append-only record of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLedger {
    pub batch_id: String,
    pub started_at: DateTime<Utc>,
    entries: Vec<LedgerEntry>,
}

impl Default for RunLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLedger {
    pub fn new() -> Self {
        Self {
            batch_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Clean up after `job` and append an entry for it.
    pub fn finalize(&mut self, job: &JobDescriptor, outcome: &RunOutcome) -> &LedgerEntry {
        let stderr_retained = discard_if_empty(&job.stderr_path);
        self.entries.push(LedgerEntry {
            invocation: job.invocation.clone(),
            outcome: *outcome,
            stderr_retained,
            finished_at: Utc::now(),
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> LedgerSummary {
        let mut summary = LedgerSummary {
            total: self.entries.len(),
            ..LedgerSummary::default()
        };
        for entry in &self.entries {
            match entry.outcome {
                RunOutcome::Completed { .. } => summary.completed += 1,
                RunOutcome::TimedOut => summary.timed_out += 1,
                RunOutcome::Crashed { .. } => summary.crashed += 1,
            }
            if entry.stderr_retained {
                summary.stderr_retained += 1;
            }
        }
        summary
    }

    /// Write the ledger as pretty JSON.
    pub fn write_json(&self, path: &Path) -> RunnerResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Delete `path` if it is a zero-length file. Returns whether a non-empty
/// file remains.
fn discard_if_empty(path: &Path) -> bool {
    let len = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot stat stderr log");
            return true;
        }
    };
    if len > 0 {
        return true;
    }
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed empty stderr log"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "cannot remove empty stderr log"),
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn job(dir: &Path, name: &str) -> JobDescriptor {
        JobDescriptor::new(
            format!("solver {name}"),
            dir.join(format!("{name}.log")),
            dir.join(format!("{name}.err.log")),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn test_empty_stderr_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let j = job(dir.path(), "quiet");
        std::fs::write(&j.stderr_path, "").unwrap();

        let mut ledger = RunLedger::new();
        let entry = ledger.finalize(&j, &RunOutcome::Completed { exit_code: 0 });
        assert!(!entry.stderr_retained);
        assert!(!j.stderr_path.exists());
    }

    #[test]
    fn test_non_empty_stderr_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let j = job(dir.path(), "noisy");
        std::fs::write(&j.stderr_path, "segfault\n").unwrap();

        let mut ledger = RunLedger::new();
        let entry = ledger.finalize(&j, &RunOutcome::Crashed { signal: Some(11) });
        assert!(entry.stderr_retained);
        assert!(j.stderr_path.exists());
    }

    #[test]
    fn test_missing_stderr_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let j = job(dir.path(), "never");
        let mut ledger = RunLedger::new();
        assert!(!ledger.finalize(&j, &RunOutcome::TimedOut).stderr_retained);
    }

    #[test]
    fn test_summary_counts_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = RunLedger::new();
        ledger.finalize(&job(dir.path(), "a"), &RunOutcome::Completed { exit_code: 0 });
        ledger.finalize(&job(dir.path(), "b"), &RunOutcome::Completed { exit_code: 1 });
        ledger.finalize(&job(dir.path(), "c"), &RunOutcome::TimedOut);
        ledger.finalize(&job(dir.path(), "d"), &RunOutcome::Crashed { signal: None });

        let s = ledger.summary();
        assert_eq!(s.total, 4);
        assert_eq!(s.completed, 2);
        assert_eq!(s.timed_out, 1);
        assert_eq!(s.crashed, 1);
        assert_eq!(s.stderr_retained, 0);
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = RunLedger::new();
        ledger.finalize(&job(dir.path(), "a"), &RunOutcome::TimedOut);

        let path = dir.path().join("out").join("ledger.json");
        ledger.write_json(&path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["batch_id"], ledger.batch_id.as_str());
        assert_eq!(value["entries"][0]["outcome"]["kind"], "timed_out");
    }
}
