//! Plain-text rendering of batch and aggregation results.

use solverbench_core::{AggregateReport, Diagnostic};
use solverbench_runner::LedgerSummary;

/// Fixed-width table of every aggregate row, configurations first.
pub fn render_report(report: &AggregateReport) -> String {
    let width = report
        .all_rows()
        .map(|r| r.label.len())
        .max()
        .unwrap_or(0)
        .max("configuration".len());

    let mut out = String::new();
    out.push_str(&format!(
        "Instances: {} included, {} excluded, {} skipped (coverage: {}, max time: {}s)\n\n",
        report.included.len(),
        report.excluded.len(),
        report.skipped.len(),
        report.coverage.as_str(),
        report.max_time,
    ));
    out.push_str(&format!(
        "{:<width$}  {:>5}  {:>5}  {:>6}  {:>5}  {:>7}\n",
        "configuration", "sat", "unsat", "proven", "best", "fastest"
    ));
    out.push_str(&format!("{}\n", "-".repeat(width + 38)));
    for row in report.all_rows() {
        out.push_str(&format!(
            "{:<width$}  {:>5}  {:>5}  {:>6}  {:>5}  {:>7}\n",
            row.label,
            row.sat_count,
            row.unsat_count,
            row.proven_count,
            row.best_found_count,
            row.fastest_count,
        ));
    }

    if !report.diagnostics.is_empty() {
        out.push_str(&format!("\nDiagnostics ({}):\n", report.diagnostics.len()));
        for d in &report.diagnostics {
            match d {
                Diagnostic::PolicyMismatch {
                    instance,
                    label,
                    expected,
                    found,
                } => out.push_str(&format!(
                    "  - {instance}: {label} reports {found}, expected {expected}\n"
                )),
                Diagnostic::ContradictoryProof {
                    instance,
                    sat,
                    unsat,
                } => out.push_str(&format!(
                    "  - {instance}: sat per {}, unsat per {}\n",
                    sat.join(","),
                    unsat.join(",")
                )),
            }
        }
    }
    out
}

pub fn render_batch(batch_id: &str, summary: &LedgerSummary, duration_ms: u64) -> String {
    let status = if summary.crashed == 0 { "✓" } else { "✗" };
    format!(
        "Batch: {batch_id}\n\
         Status: {status} {} jobs in {duration_ms}ms\n  \
         completed: {}\n  timed out: {}\n  crashed:   {}\n  \
         stderr logs kept: {}\n",
        summary.total,
        summary.completed,
        summary.timed_out,
        summary.crashed,
        summary.stderr_retained,
    )
}
