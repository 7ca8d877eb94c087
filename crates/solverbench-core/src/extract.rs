//! Log extractor: solver standard output → [`ResultRecord`].
//!
//! Extraction fails soft. A missing file, a log without any solutions line,
//! or a line that does not fit the selected [`Dialect`] all yield the
//! sentinel record (`solution_count == -1`). [`parse_log`] exposes the
//! underlying reason for callers that want it.
//!
//! What is read from a log:
//! - the last two `<n> Solutions, ...` lines (the tie rule picks one),
//! - the last terminal-status line (`==========`, `=====UNSATISFIABLE=====`, ...),
//! - the first `Building time : <t>s` occurrence.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::dialect::{Dialect, TieRule};
use crate::error::{BenchError, Result};
use crate::obs;
use crate::record::{InstanceResultSet, Policy, ProofStatus, ResultRecord};

/// Category of the final status line printed by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// Search space exhausted.
    Exhaustive,
    /// Proven to have no solution.
    Infeasible,
    /// Proven unbounded.
    Unbounded,
    /// Any other terminal marker (limit reached, unknown, error).
    Other,
}

impl Terminal {
    pub fn proof_status(terminal: Option<Terminal>) -> ProofStatus {
        match terminal {
            Some(Terminal::Exhaustive) | Some(Terminal::Infeasible) => ProofStatus::Proof,
            Some(Terminal::Unbounded) => ProofStatus::Unbounded,
            Some(Terminal::Other) => ProofStatus::Unknown,
            None => ProofStatus::Blank,
        }
    }
}

struct LinePatterns {
    solutions: Regex,
    build: Regex,
    optimisation: Regex,
}

fn patterns() -> &'static LinePatterns {
    static PATTERNS: OnceLock<LinePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| LinePatterns {
        solutions: Regex::new(r"^\s*%?\s*(\d+) Solutions, ").expect("solutions pattern"),
        build: Regex::new(r"Building time\s*:\s*([\d,]*\.?\d+)\s*s").expect("build pattern"),
        optimisation: Regex::new(r"\b(Minimize|Maximize)\b").expect("optimisation pattern"),
    })
}

/// Classify a line as a terminal-status line, if it is one.
pub fn classify_terminal(line: &str) -> Option<Terminal> {
    let t = line.trim().trim_start_matches('%').trim();
    match t {
        "==========" => Some(Terminal::Exhaustive),
        "=====UNSATISFIABLE=====" => Some(Terminal::Infeasible),
        "=====UNBOUNDED=====" => Some(Terminal::Unbounded),
        "=====UNKNOWN=====" | "=====UNSATorUNBOUNDED=====" | "=====ERROR=====" => {
            Some(Terminal::Other)
        }
        _ if t.starts_with("- Complete search") => Some(Terminal::Exhaustive),
        _ if t.starts_with("- Incomplete search") => Some(Terminal::Other),
        _ => None,
    }
}

/// Extract the record for one run from its stdout log on disk.
///
/// Never fails: an absent or unreadable log is evidence that the run never
/// finished and becomes the sentinel record.
pub fn extract(log_path: &Path, config_label: &str, max_time: f64, dialect: &Dialect) -> ResultRecord {
    match std::fs::read_to_string(log_path) {
        Ok(text) => extract_str(&text, config_label, max_time, dialect),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %log_path.display(), label = %config_label, "log not found");
            ResultRecord::sentinel(config_label, max_time)
        }
        Err(e) => {
            let err = BenchError::Read {
                path: log_path.to_path_buf(),
                source: e,
            };
            obs::emit_extract_sentinel(config_label, &err);
            ResultRecord::sentinel(config_label, max_time)
        }
    }
}

/// Same as [`extract`] for an in-memory log.
pub fn extract_str(text: &str, config_label: &str, max_time: f64, dialect: &Dialect) -> ResultRecord {
    match parse_log(text, config_label, max_time, dialect) {
        Ok(record) => record,
        Err(e) => {
            obs::emit_extract_sentinel(config_label, &e);
            ResultRecord::sentinel(config_label, max_time)
        }
    }
}

/// Extract one instance's records for every label from `output_dir`.
pub fn extract_instance(
    output_dir: &Path,
    instance: &str,
    labels: &[String],
    max_time: f64,
    dialect: &Dialect,
) -> InstanceResultSet {
    let mut set = InstanceResultSet::new(instance);
    for label in labels {
        let path = crate::artifacts::log_path_for(output_dir, instance, label);
        set.insert(extract(&path, label, max_time, dialect));
    }
    set
}

/// Strict parser behind [`extract_str`].
pub fn parse_log(
    text: &str,
    config_label: &str,
    max_time: f64,
    dialect: &Dialect,
) -> Result<ResultRecord> {
    check_max_time(max_time)?;
    let p = patterns();

    let mut previous: Option<(&str, i64)> = None;
    let mut latest: Option<(&str, i64)> = None;
    let mut terminal = None;
    let mut build_time = None;

    for line in text.lines() {
        if let Some(caps) = p.solutions.captures(line) {
            let count = caps[1].parse::<i64>().map_err(|e| malformed(dialect, e))?;
            previous = latest.take();
            latest = Some((line, count));
        }
        if build_time.is_none() {
            if let Some(caps) = p.build.captures(line) {
                build_time = parse_number(&caps[1]).ok();
            }
        }
        if let Some(t) = classify_terminal(line) {
            terminal = Some(t);
        }
    }

    let (line, solution_count) = match (previous, latest) {
        (Some(earlier), Some(last))
            if earlier.1 == last.1 && dialect.tie_rule == TieRule::PreferEarlier =>
        {
            earlier
        }
        (_, Some(last)) => last,
        _ => return Err(BenchError::NoSolutionLine),
    };

    let fields = parse_solutions_line(line, solution_count, dialect)?;

    Ok(ResultRecord {
        solution_count,
        elapsed_time: clamp_time(fields.time, max_time),
        node_count: fields.nodes,
        build_time: build_time.unwrap_or(0.0),
        policy: fields.policy,
        objective: fields.objective,
        proof_status: Terminal::proof_status(terminal),
        config_label: config_label.to_string(),
    })
}

/// Clamp an elapsed time into `[0, max_time]`. Does not panic on a
/// negative or NaN ceiling; [`parse_log`] rejects those before clamping.
pub fn clamp_time(time: f64, max_time: f64) -> f64 {
    if time.is_nan() {
        return max_time;
    }
    time.max(0.0).min(max_time)
}

fn check_max_time(max_time: f64) -> Result<()> {
    if max_time.is_finite() && max_time >= 0.0 {
        Ok(())
    } else {
        Err(BenchError::InvalidConfig(format!(
            "max time must be a non-negative number of seconds, got {max_time}"
        )))
    }
}

struct LineFields {
    time: f64,
    nodes: Option<u64>,
    policy: Policy,
    objective: Option<i64>,
}

fn parse_solutions_line(line: &str, solution_count: i64, dialect: &Dialect) -> Result<LineFields> {
    let body = line.trim().trim_start_matches('%').trim();
    let fields: Vec<&str> = body.split(", ").map(str::trim).collect();
    let optimisation = patterns().optimisation.is_match(body);
    let layout = dialect.layout(optimisation);

    if fields.len() < layout.min_fields() {
        return Err(malformed(
            dialect,
            format!(
                "expected at least {} fields, found {}",
                layout.min_fields(),
                fields.len()
            ),
        ));
    }

    let time = parse_seconds(fields[layout.time]).map_err(|e| malformed(dialect, e))?;
    let nodes = fields[layout.nodes]
        .split_whitespace()
        .next()
        .and_then(|t| t.replace(',', "").parse::<u64>().ok());

    let (policy, objective) = match layout.objective {
        Some(idx) => {
            let field = fields[idx];
            let policy = if field.starts_with("Minimize") {
                Policy::Min
            } else if field.starts_with("Maximize") {
                Policy::Max
            } else {
                return Err(malformed(
                    dialect,
                    format!("field {} is not an objective: {:?}", idx, field),
                ));
            };
            let raw = field.rsplit('=').next().unwrap_or_default().trim();
            let objective = match raw.replace(',', "").parse::<i64>() {
                Ok(v) => Some(v),
                // nothing to report before the first solution
                Err(_) if solution_count == 0 => None,
                Err(e) => return Err(malformed(dialect, format!("objective {:?}: {}", raw, e))),
            };
            (policy, objective)
        }
        None => (Policy::Sat, None),
    };

    Ok(LineFields {
        time,
        nodes,
        policy,
        objective,
    })
}

/// `"Resolution 1.234s"` / `"Total 1,234.5s"` → seconds.
fn parse_seconds(field: &str) -> std::result::Result<f64, String> {
    let token = field
        .split_whitespace()
        .last()
        .ok_or_else(|| "empty time field".to_string())?;
    parse_number(token.trim_end_matches('s')).map_err(|e| format!("time {:?}: {}", field, e))
}

fn parse_number(raw: &str) -> std::result::Result<f64, std::num::ParseFloatError> {
    raw.replace(',', "").parse::<f64>()
}

fn malformed(dialect: &Dialect, reason: impl ToString) -> BenchError {
    BenchError::MalformedLine {
        dialect: dialect.name().to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT_MIN: &str = "\
% 1 Solutions, Minimize cost = 40, Resolution 0.512s, 120 Nodes (234.4 n/s), 80 Backtracks, 40 Fails, 0 Restarts
% 2 Solutions, Minimize cost = 31, Resolution 1.250s, 4,210 Nodes (3,368.0 n/s), 4100 Backtracks, 2050 Fails, 0 Restarts
==========
";

    #[test]
    fn test_classify_terminal_lines() {
        assert_eq!(classify_terminal("=========="), Some(Terminal::Exhaustive));
        assert_eq!(
            classify_terminal("  =====UNSATISFIABLE=====  "),
            Some(Terminal::Infeasible)
        );
        assert_eq!(
            classify_terminal("=====UNBOUNDED====="),
            Some(Terminal::Unbounded)
        );
        assert_eq!(classify_terminal("=====UNKNOWN====="), Some(Terminal::Other));
        assert_eq!(
            classify_terminal("- Complete search - 1 solution found."),
            Some(Terminal::Exhaustive)
        );
        assert_eq!(
            classify_terminal("- Incomplete search - Limit reached."),
            Some(Terminal::Other)
        );
        assert_eq!(classify_terminal("x = 3;"), None);
        assert_eq!(classify_terminal("----------"), None);
    }

    #[test]
    fn test_proof_status_mapping() {
        assert_eq!(Terminal::proof_status(Some(Terminal::Exhaustive)), ProofStatus::Proof);
        assert_eq!(Terminal::proof_status(Some(Terminal::Infeasible)), ProofStatus::Proof);
        assert_eq!(Terminal::proof_status(Some(Terminal::Unbounded)), ProofStatus::Unbounded);
        assert_eq!(Terminal::proof_status(Some(Terminal::Other)), ProofStatus::Unknown);
        assert_eq!(Terminal::proof_status(None), ProofStatus::Blank);
    }

    #[test]
    fn test_parse_short_minimisation() {
        let r = parse_log(SHORT_MIN, "cfg", 60.0, &Dialect::short()).unwrap();
        assert_eq!(r.solution_count, 2);
        assert_eq!(r.policy, Policy::Min);
        assert_eq!(r.objective, Some(31));
        assert_eq!(r.elapsed_time, 1.25);
        assert_eq!(r.node_count, Some(4210));
        assert_eq!(r.proof_status, ProofStatus::Proof);
        assert_eq!(r.build_time, 0.0);
        assert_eq!(r.config_label, "cfg");
    }

    #[test]
    fn test_parse_full_satisfaction_with_build_time() {
        let log = "\
% 1 Solutions, Building time : 0.250s, Initialisation : 0.010s, Initial propagation : 0.002s, Total 3.100s, 99 Nodes (31.9 n/s), 50 Backtracks, 25 Fails, 0 Restarts, 100 + 200 Propagations
----------
- Incomplete search - Limit reached.
";
        let r = parse_log(log, "cfg", 60.0, &Dialect::full()).unwrap();
        assert_eq!(r.policy, Policy::Sat);
        assert_eq!(r.objective, None);
        assert_eq!(r.elapsed_time, 3.1);
        assert_eq!(r.node_count, Some(99));
        assert_eq!(r.build_time, 0.25);
        assert_eq!(r.proof_status, ProofStatus::Unknown);
    }

    #[test]
    fn test_time_is_clamped() {
        let log = "% 1 Solutions, Maximize profit = 9, Resolution 75.000s, 10 Nodes (0.1 n/s)\n";
        let r = parse_log(log, "cfg", 60.0, &Dialect::short()).unwrap();
        assert_eq!(r.elapsed_time, 60.0);
        assert_eq!(r.policy, Policy::Max);
        assert_eq!(r.objective, Some(9));
        assert_eq!(r.proof_status, ProofStatus::Blank);
    }

    #[test]
    fn test_tie_rule_prefers_earlier_line() {
        // the trailing summary repeats the count with a different layout
        let log = "\
% 3 Solutions, Minimize cost = 12, Resolution 2.000s, 500 Nodes (250.0 n/s)
% 3 Solutions, Minimize cost = 12, Building time : 0.100s, Initialisation : 0.010s, Initial propagation : 0.005s, Total 9.900s, 501 Nodes (50.6 n/s)
==========
";
        let earlier = parse_log(log, "cfg", 60.0, &Dialect::short()).unwrap();
        assert_eq!(earlier.elapsed_time, 2.0);
        assert_eq!(earlier.node_count, Some(500));

        let latest_rule = Dialect::short().with_tie_rule(TieRule::PreferLatest);
        let latest = parse_log(log, "cfg", 60.0, &latest_rule).unwrap();
        // short offsets applied to the full-layout summary land on "Building time"
        assert_eq!(latest.elapsed_time, 0.1);
    }

    #[test]
    fn test_no_tie_takes_latest_line() {
        let r = parse_log(SHORT_MIN, "cfg", 60.0, &Dialect::short()).unwrap();
        assert_eq!(r.solution_count, 2);
    }

    #[test]
    fn test_no_solution_line_is_error_and_sentinel() {
        let log = "some banner\n=====UNKNOWN=====\n";
        assert!(matches!(
            parse_log(log, "cfg", 30.0, &Dialect::full()),
            Err(BenchError::NoSolutionLine)
        ));
        let r = extract_str(log, "cfg", 30.0, &Dialect::full());
        assert_eq!(r, ResultRecord::sentinel("cfg", 30.0));
    }

    #[test]
    fn test_wrong_dialect_degrades_to_sentinel() {
        // a short-layout line does not have enough fields for the full dialect
        let log = "% 1 Solutions, Resolution 0.5s, 3 Nodes (6.0 n/s)\n";
        assert!(matches!(
            parse_log(log, "cfg", 30.0, &Dialect::full()),
            Err(BenchError::MalformedLine { .. })
        ));
        assert!(extract_str(log, "cfg", 30.0, &Dialect::full()).is_sentinel());
    }

    #[test]
    fn test_zero_solutions_optimisation_has_no_objective() {
        let log = "% 0 Solutions, Minimize cost = -, Resolution 4.000s, 77 Nodes (19.2 n/s)\n=====UNSATISFIABLE=====\n";
        let r = parse_log(log, "cfg", 60.0, &Dialect::short()).unwrap();
        assert_eq!(r.solution_count, 0);
        assert_eq!(r.objective, None);
        assert_eq!(r.policy, Policy::Min);
        assert_eq!(r.proof_status, ProofStatus::Proof);
    }

    #[test]
    fn test_unknown_node_count() {
        let log = "% 1 Solutions, Resolution 0.5s, ? Nodes\n";
        let r = parse_log(log, "cfg", 30.0, &Dialect::short()).unwrap();
        assert_eq!(r.node_count, None);
    }

    #[test]
    fn test_missing_file_is_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let r = extract(&dir.path().join("nope.log"), "cfg", 42.0, &Dialect::full());
        assert_eq!(r.solution_count, -1);
        assert_eq!(r.elapsed_time, 42.0);
        assert_eq!(r.policy, Policy::Unknown);
    }

    #[test]
    fn test_clamp_time_edges() {
        assert_eq!(clamp_time(-1.0, 10.0), 0.0);
        assert_eq!(clamp_time(f64::NAN, 10.0), 10.0);
        assert_eq!(clamp_time(3.5, 10.0), 3.5);
        assert_eq!(clamp_time(3.5, -1.0), -1.0);
        assert_eq!(clamp_time(3.5, f64::NAN), 3.5);
    }

    #[test]
    fn test_invalid_max_time_degrades_to_sentinel() {
        let log = "% 1 Solutions, Resolution 0.5s, 3 Nodes (6.0 n/s)\n";
        for max_time in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                parse_log(log, "cfg", max_time, &Dialect::short()),
                Err(BenchError::InvalidConfig(_))
            ));
            let r = extract_str(log, "cfg", max_time, &Dialect::short());
            assert_eq!(r.solution_count, -1);
            assert_eq!(r.policy, Policy::Unknown);
        }
    }
}
