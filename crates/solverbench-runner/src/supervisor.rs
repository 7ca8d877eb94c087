//! Process supervisor: runs one job to completion or to its deadline.
//!
//! Each job runs as `sh -c <invocation>` leading its own process group, so
//! that termination reaches the solver and anything it forked. The wait is a
//! single `tokio::time::timeout` around `Child::wait`; on expiry the group
//! gets SIGTERM, a short grace period, then SIGKILL.

use std::fs::File;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use solverbench_core::obs;
use tokio::process::{Child, Command};

use crate::job::{JobDescriptor, RunOutcome};

/// Default wait between SIGTERM and SIGKILL.
pub const DEFAULT_GRACE: Duration = Duration::from_millis(100);

/// Runs jobs under their deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Supervisor {
    grace: Duration,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self {
            grace: DEFAULT_GRACE,
        }
    }
}

impl Supervisor {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Run `job` and classify how it ended.
    ///
    /// Never fails: spawn and signalling errors are logged with the
    /// invocation and reported as [`RunOutcome::Crashed`]. Both artifact
    /// files exist afterwards whenever their directories are writable.
    pub async fn run(&self, job: &JobDescriptor) -> RunOutcome {
        let start = Instant::now();
        obs::emit_job_started(&job.invocation, job.deadline_ms());

        let mut child = match spawn(job) {
            Ok(child) => child,
            Err(e) => {
                obs::emit_job_crashed(&job.invocation, None, &format!("spawn failed: {e}"));
                return RunOutcome::Crashed { signal: None };
            }
        };
        // process_group(0) makes the leader's pid the group id
        let pgid = child.id();

        match tokio::time::timeout(job.deadline, child.wait()).await {
            Ok(Ok(status)) => {
                // background children of the leader must not outlive the job
                if let Some(pgid) = pgid {
                    if let Err(e) = signal_group(pgid, libc::SIGKILL) {
                        obs::emit_job_crashed(&job.invocation, Some(libc::SIGKILL), &format!("SIGKILL failed: {e}"));
                        return RunOutcome::Crashed {
                            signal: Some(libc::SIGKILL),
                        };
                    }
                }
                classify_exit(job, status, start)
            }
            Ok(Err(e)) => {
                obs::emit_job_crashed(&job.invocation, None, &format!("wait failed: {e}"));
                if let Some(pgid) = pgid {
                    let _ = signal_group(pgid, libc::SIGKILL);
                }
                RunOutcome::Crashed { signal: None }
            }
            Err(_) => self.terminate(job, &mut child, pgid).await,
        }
    }

    async fn terminate(&self, job: &JobDescriptor, child: &mut Child, pgid: Option<u32>) -> RunOutcome {
        let Some(pgid) = pgid else {
            // already reaped between the timeout and here
            obs::emit_job_timed_out(&job.invocation, job.deadline_ms(), false);
            return RunOutcome::TimedOut;
        };

        if let Err(e) = signal_group(pgid, libc::SIGTERM) {
            obs::emit_job_crashed(&job.invocation, Some(libc::SIGTERM), &format!("SIGTERM failed: {e}"));
            let _ = signal_group(pgid, libc::SIGKILL);
            let _ = child.wait().await;
            return RunOutcome::Crashed {
                signal: Some(libc::SIGTERM),
            };
        }

        let forced = match tokio::time::timeout(self.grace, child.wait()).await {
            Ok(Ok(_)) => false,
            Ok(Err(e)) => {
                obs::emit_job_crashed(&job.invocation, Some(libc::SIGTERM), &format!("wait failed: {e}"));
                let _ = signal_group(pgid, libc::SIGKILL);
                return RunOutcome::Crashed {
                    signal: Some(libc::SIGTERM),
                };
            }
            Err(_) => true,
        };

        // Also reaps group members that outlived the leader.
        if let Err(e) = signal_group(pgid, libc::SIGKILL) {
            obs::emit_job_crashed(&job.invocation, Some(libc::SIGKILL), &format!("SIGKILL failed: {e}"));
            return RunOutcome::Crashed {
                signal: Some(libc::SIGKILL),
            };
        }
        if forced {
            if let Err(e) = child.wait().await {
                obs::emit_job_crashed(&job.invocation, Some(libc::SIGKILL), &format!("wait failed: {e}"));
                return RunOutcome::Crashed {
                    signal: Some(libc::SIGKILL),
                };
            }
        }

        obs::emit_job_timed_out(&job.invocation, job.deadline_ms(), forced);
        RunOutcome::TimedOut
    }
}

fn spawn(job: &JobDescriptor) -> io::Result<Child> {
    let stdout = create_artifact(&job.stdout_path)?;
    let stderr = create_artifact(&job.stderr_path)?;

    Command::new("sh")
        .arg("-c")
        .arg(&job.invocation)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .process_group(0)
        .kill_on_drop(true)
        .spawn()
}

fn create_artifact(path: &std::path::Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    File::create(path)
}

fn classify_exit(job: &JobDescriptor, status: ExitStatus, start: Instant) -> RunOutcome {
    match status.code() {
        Some(exit_code) => {
            obs::emit_job_finished(&job.invocation, exit_code, start.elapsed().as_millis() as u64);
            RunOutcome::Completed { exit_code }
        }
        None => {
            let signal = status.signal();
            obs::emit_job_crashed(&job.invocation, signal, &"terminated by signal");
            RunOutcome::Crashed { signal }
        }
    }
}

/// Send `signal` to process group `pgid`. A group that no longer exists is
/// not an error.
fn signal_group(pgid: u32, signal: libc::c_int) -> io::Result<()> {
    let ret = unsafe { libc::killpg(pgid as libc::pid_t, signal) };
    if ret == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        Ok(())
    } else {
        Err(err)
    }
}
