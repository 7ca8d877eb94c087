//! Bounded worker pool.
//!
//! A single control task drives at most `concurrency` supervisors at once
//! and refills from the backlog as each finishes. With `concurrency == 1`
//! jobs run one after another in input order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use futures::stream::{self, StreamExt};
use solverbench_core::obs;
use tracing::{info, Instrument};

use crate::error::{RunnerError, RunnerResult};
use crate::job::{JobDescriptor, RunOutcome};
use crate::ledger::RunLedger;
use crate::supervisor::Supervisor;

/// Receives a callback after every finished job.
///
/// Called from the control task in completion order; implementations must
/// not block.
pub trait ProgressObserver: Send + Sync {
    fn on_job_done(&self, job: &JobDescriptor, outcome: &RunOutcome, done: usize, total: usize);
}

/// Observer that logs each completion and keeps a running counter.
#[derive(Debug, Default)]
pub struct LogProgress {
    completed: AtomicUsize,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }
}

impl ProgressObserver for LogProgress {
    fn on_job_done(&self, job: &JobDescriptor, outcome: &RunOutcome, done: usize, total: usize) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        info!(
            event = "batch.progress",
            done = done,
            total = total,
            outcome = outcome.name(),
            log = %job.stdout_path.display(),
        );
    }
}

/// Runs a backlog of jobs with bounded parallelism.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    concurrency: usize,
    supervisor: Supervisor,
}

impl WorkerPool {
    pub fn new(concurrency: usize) -> RunnerResult<Self> {
        if concurrency == 0 {
            return Err(RunnerError::InvalidConcurrency(concurrency));
        }
        Ok(Self {
            concurrency,
            supervisor: Supervisor::default(),
        })
    }

    pub fn with_supervisor(mut self, supervisor: Supervisor) -> Self {
        self.supervisor = supervisor;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every job and return their outcomes, index-aligned with `jobs`.
    ///
    /// Each job is finalized in `ledger` and reported to `observer` as soon
    /// as it ends. Completion order among concurrent jobs is unspecified.
    pub async fn run_all(
        &self,
        jobs: Vec<JobDescriptor>,
        ledger: &mut RunLedger,
        observer: &dyn ProgressObserver,
    ) -> Vec<RunOutcome> {
        let span = obs::batch_span(&ledger.batch_id);
        self.drain(jobs, ledger, observer).instrument(span).await
    }

    async fn drain(
        &self,
        jobs: Vec<JobDescriptor>,
        ledger: &mut RunLedger,
        observer: &dyn ProgressObserver,
    ) -> Vec<RunOutcome> {
        let start = Instant::now();
        let total = jobs.len();
        let mut finished: Vec<(usize, RunOutcome)> = Vec::with_capacity(total);

        if self.concurrency == 1 {
            for (index, job) in jobs.iter().enumerate() {
                let outcome = self.supervisor.run(job).await;
                ledger.finalize(job, &outcome);
                finished.push((index, outcome));
                observer.on_job_done(job, &outcome, finished.len(), total);
            }
        } else {
            let supervisor = &self.supervisor;
            let mut in_flight = stream::iter(jobs.iter().enumerate())
                .map(|(index, job)| async move { (index, supervisor.run(job).await) })
                .buffer_unordered(self.concurrency);

            while let Some((index, outcome)) = in_flight.next().await {
                let job = &jobs[index];
                ledger.finalize(job, &outcome);
                finished.push((index, outcome));
                observer.on_job_done(job, &outcome, finished.len(), total);
            }
            finished.sort_by_key(|(index, _)| *index);
        }

        let outcomes: Vec<RunOutcome> = finished.into_iter().map(|(_, outcome)| outcome).collect();
        obs::emit_batch_finished(
            total,
            outcomes.iter().filter(|o| o.is_completed()).count(),
            outcomes.iter().filter(|o| o.is_timed_out()).count(),
            outcomes.iter().filter(|o| o.is_crashed()).count(),
            start.elapsed().as_millis() as u64,
        );
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;

    fn echo_job(dir: &Path, i: usize) -> JobDescriptor {
        JobDescriptor::new(
            format!("echo job-{i}"),
            dir.join(format!("{i}.log")),
            dir.join("error").join(format!("{i}.err.log")),
            Duration::from_secs(10),
        )
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, usize)>>,
    }

    impl ProgressObserver for Recorder {
        fn on_job_done(&self, job: &JobDescriptor, _: &RunOutcome, done: usize, _: usize) {
            self.seen.lock().unwrap().push((job.invocation.clone(), done));
        }
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(matches!(
            WorkerPool::new(0),
            Err(RunnerError::InvalidConcurrency(0))
        ));
    }

    #[tokio::test]
    async fn test_sequential_mode_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let jobs: Vec<_> = (0..4).map(|i| echo_job(dir.path(), i)).collect();
        let pool = WorkerPool::new(1).unwrap();
        let recorder = Recorder::default();
        let mut ledger = RunLedger::new();

        let outcomes = pool.run_all(jobs, &mut ledger, &recorder).await;
        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().all(|o| o.is_completed()));

        let seen = recorder.seen.lock().unwrap();
        let order: Vec<_> = seen.iter().map(|(inv, _)| inv.as_str()).collect();
        assert_eq!(order, vec!["echo job-0", "echo job-1", "echo job-2", "echo job-3"]);
        assert_eq!(seen.last().unwrap().1, 4);
    }

    #[tokio::test]
    async fn test_outcomes_align_with_jobs() {
        let dir = tempfile::tempdir().unwrap();
        // first job finishes last
        let jobs = vec![
            JobDescriptor::new(
                "sleep 0.3; exit 7",
                dir.path().join("slow.log"),
                dir.path().join("slow.err.log"),
                Duration::from_secs(10),
            ),
            echo_job(dir.path(), 1),
            echo_job(dir.path(), 2),
        ];
        let pool = WorkerPool::new(3).unwrap();
        let progress = LogProgress::new();
        let mut ledger = RunLedger::new();

        let outcomes = pool.run_all(jobs, &mut ledger, &progress).await;
        assert_eq!(outcomes[0], RunOutcome::Completed { exit_code: 7 });
        assert_eq!(outcomes[1], RunOutcome::Completed { exit_code: 0 });
        assert_eq!(progress.completed(), 3);
        assert_eq!(ledger.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_backlog() {
        let pool = WorkerPool::new(4).unwrap();
        let mut ledger = RunLedger::new();
        let outcomes = pool.run_all(Vec::new(), &mut ledger, &LogProgress::new()).await;
        assert!(outcomes.is_empty());
        assert!(ledger.is_empty());
    }
}
