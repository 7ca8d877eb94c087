//! Structured observability hooks for batch and report lifecycle events.
//!
//! This module provides:
//! - A batch-scoped tracing span via [`batch_span`]
//! - Emission functions for job lifecycle, extraction and aggregation events
//!
//! Events are emitted at `info!` level unless noted (filter with `RUST_LOG`).
//! For JSON output, pass `--json` to the CLI.

use tracing::{debug, error, info, warn};

use crate::record::Policy;

/// Span tagging every event of one batch with its id.
///
/// Attach it to the batch future with `tracing::Instrument` rather than
/// entering it, since the pool awaits across job completions:
///
/// ```ignore
/// let span = batch_span(&batch_id);
/// drain(jobs).instrument(span).await;
/// ```
pub fn batch_span(batch_id: &str) -> tracing::Span {
    tracing::info_span!("solverbench.batch", batch_id = %batch_id)
}

/// Emit event: a job was handed to the supervisor.
pub fn emit_job_started(invocation: &str, deadline_ms: u64) {
    debug!(event = "job.started", invocation = %invocation, deadline_ms = deadline_ms);
}

/// Emit event: a job exited on its own.
pub fn emit_job_finished(invocation: &str, exit_code: i32, duration_ms: u64) {
    info!(
        event = "job.finished",
        invocation = %invocation,
        exit_code = exit_code,
        duration_ms = duration_ms,
    );
}

/// Emit event: a job hit its deadline and was terminated.
pub fn emit_job_timed_out(invocation: &str, deadline_ms: u64, forced: bool) {
    info!(
        event = "job.timed_out",
        invocation = %invocation,
        deadline_ms = deadline_ms,
        forced_kill = forced,
    );
}

/// Emit event: a job crashed or could not be supervised (error level).
pub fn emit_job_crashed(invocation: &str, signal: Option<i32>, reason: &dyn std::fmt::Display) {
    error!(
        event = "job.crashed",
        invocation = %invocation,
        signal = ?signal,
        reason = %reason,
    );
}

/// Emit event: the worker pool drained its backlog.
pub fn emit_batch_finished(total: usize, completed: usize, timed_out: usize, crashed: usize, duration_ms: u64) {
    info!(
        event = "batch.finished",
        total = total,
        completed = completed,
        timed_out = timed_out,
        crashed = crashed,
        duration_ms = duration_ms,
    );
}

/// Emit event: a log degraded to the sentinel record (warning level).
pub fn emit_extract_sentinel(label: &str, reason: &dyn std::fmt::Display) {
    warn!(event = "extract.sentinel", label = %label, reason = %reason);
}

/// Emit event: configurations disagree on an instance's policy (warning level).
pub fn emit_policy_mismatch(instance: &str, label: &str, expected: Policy, found: Policy) {
    warn!(
        event = "aggregate.policy_mismatch",
        instance = %instance,
        label = %label,
        expected = %expected,
        found = %found,
    );
}

/// Emit event: configurations proved both sat and unsat (warning level).
pub fn emit_proof_conflict(instance: &str, sat: &[String], unsat: &[String]) {
    warn!(
        event = "aggregate.proof_conflict",
        instance = %instance,
        sat = %sat.join(","),
        unsat = %unsat.join(","),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_span_create() {
        let span = batch_span("test-batch");
        let _guard = span.enter();
    }

    #[test]
    fn test_emitters_without_subscriber() {
        emit_job_started("sleep 1", 1000);
        emit_job_crashed("sleep 1", Some(9), &"killed");
        emit_policy_mismatch("i", "cfg", Policy::Min, Policy::Sat);
        emit_proof_conflict("i", &["a".to_string()], &["b".to_string()]);
    }
}
