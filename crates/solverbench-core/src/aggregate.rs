//! Cross-configuration ranking and corpus aggregation.
//!
//! Two layers:
//! - [`rank_instance`] compares the records of one instance and classifies
//!   every configuration (found the best objective, fastest, proven, sat/unsat).
//! - [`Aggregator`] folds those classifications over a corpus into one
//!   [`AggregateRow`] per configuration, plus the virtual-best-solver row and
//!   an optional row for an external best-known table.
//!
//! The aggregator is an explicit context object: callers own it, feed it
//! instance sets, and consume it with [`Aggregator::finish`].

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::best_known::BestKnownTable;
use crate::error::BenchError;
use crate::obs;
use crate::record::{InstanceResultSet, Policy, ResultRecord};

/// Label of the virtual-best-solver row.
pub const VBS_LABEL: &str = "VBS";

/// Label of the best-known table row.
pub const EXTERNAL_LABEL: &str = "external";

// ---------------------------------------------------------------------------
// Per-instance ranking
// ---------------------------------------------------------------------------

/// Classification of one record against the rest of its instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceFlags {
    pub sat: bool,
    pub unsat: bool,
    pub proven: bool,
    pub found_best: bool,
    pub fastest: bool,
}

impl InstanceFlags {
    /// Oracle combination: a flag holds if any input has it.
    pub fn any(&self, other: &InstanceFlags) -> InstanceFlags {
        InstanceFlags {
            sat: self.sat || other.sat,
            unsat: self.unsat || other.unsat,
            proven: self.proven || other.proven,
            found_best: self.found_best || other.found_best,
            fastest: self.fastest || other.fastest,
        }
    }
}

/// One configuration's flags for an instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigOutcome {
    pub label: String,
    pub flags: InstanceFlags,
}

/// Data-quality finding raised during aggregation. Never auto-corrected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A configuration reported a different policy than the instance's.
    PolicyMismatch {
        instance: String,
        label: String,
        expected: Policy,
        found: Policy,
    },
    /// Configurations proved both satisfiable and unsatisfiable.
    ContradictoryProof {
        instance: String,
        sat: Vec<String>,
        unsat: Vec<String>,
    },
}

/// Ranking of every configuration on one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRanking {
    pub instance: String,
    pub policy: Policy,
    /// Best objective across configurations (`None` for satisfaction
    /// instances, or when nobody reported one).
    pub best_objective: Option<i64>,
    /// Smallest elapsed time across configurations.
    pub best_time: f64,
    /// Elapsed time of the first record in ranking order.
    pub fastest_among_best: f64,
    /// Records in ranking order.
    pub ordered: Vec<ResultRecord>,
    /// Per-configuration flags, in label order.
    pub outcomes: Vec<ConfigOutcome>,
    pub diagnostics: Vec<Diagnostic>,
}

impl InstanceRanking {
    pub fn outcome(&self, label: &str) -> Option<&InstanceFlags> {
        self.outcomes
            .iter()
            .find(|o| o.label == label)
            .map(|o| &o.flags)
    }

    /// Flags of the virtual best solver on this instance.
    ///
    /// When configurations prove both satisfiable and unsatisfiable, the
    /// verdict of the first proven record in ranking order is kept so the
    /// instance counts once.
    pub fn oracle(&self) -> InstanceFlags {
        let mut flags = self
            .outcomes
            .iter()
            .fold(InstanceFlags::default(), |acc, o| acc.any(&o.flags));
        if flags.sat && flags.unsat {
            let verdict = self
                .ordered
                .iter()
                .filter_map(|r| self.outcome(&r.config_label))
                .find(|f| f.sat || f.unsat)
                .copied()
                .unwrap_or_default();
            flags.sat = verdict.sat;
            flags.unsat = verdict.unsat;
        }
        flags
    }
}

/// Instance policy: the first non-`Unknown` policy in label order.
fn instance_policy(set: &InstanceResultSet) -> Policy {
    set.records
        .values()
        .map(|r| r.policy)
        .find(|p| *p != Policy::Unknown)
        .unwrap_or(Policy::Unknown)
}

/// Objective order for `policy`; records without an objective sort last.
fn compare_objective(policy: Policy, a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => match policy {
            Policy::Min => x.cmp(&y),
            Policy::Max => y.cmp(&x),
            Policy::Sat | Policy::Unknown => Ordering::Equal,
        },
        (Some(_), None) if policy.is_optimisation() => Ordering::Less,
        (None, Some(_)) if policy.is_optimisation() => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Rank one instance's records. Returns `None` for an empty set.
pub fn rank_instance(set: &InstanceResultSet, max_time: f64) -> Option<InstanceRanking> {
    if set.is_empty() {
        return None;
    }

    let policy = instance_policy(set);
    let mut diagnostics = Vec::new();
    for record in set.records.values() {
        if record.policy != Policy::Unknown && record.policy != policy {
            obs::emit_policy_mismatch(&set.instance, &record.config_label, policy, record.policy);
            diagnostics.push(Diagnostic::PolicyMismatch {
                instance: set.instance.clone(),
                label: record.config_label.clone(),
                expected: policy,
                found: record.policy,
            });
        }
    }

    let mut ordered: Vec<ResultRecord> = set.records.values().cloned().collect();
    ordered.sort_by(|a, b| {
        compare_objective(policy, a.objective, b.objective)
            .then_with(|| a.elapsed_time.total_cmp(&b.elapsed_time))
    });

    let best_objective = if policy.is_optimisation() {
        ordered[0].objective
    } else {
        None
    };
    let fastest_among_best = ordered[0].elapsed_time;
    let best_time = ordered
        .iter()
        .map(|r| r.elapsed_time)
        .fold(f64::INFINITY, f64::min);

    let outcomes = set
        .records
        .values()
        .map(|record| {
            let found_best = record.is_definite()
                && (!policy.is_optimisation() || record.objective == best_objective);
            let proven = record.is_proven();
            let is_sat = policy == Policy::Sat;
            ConfigOutcome {
                label: record.config_label.clone(),
                flags: InstanceFlags {
                    sat: is_sat && proven && record.solution_count >= 1,
                    unsat: is_sat && proven && record.solution_count == 0,
                    proven,
                    found_best,
                    fastest: record.elapsed_time == best_time && record.elapsed_time < max_time,
                },
            }
        })
        .collect::<Vec<ConfigOutcome>>();

    let proved = |pick: fn(&InstanceFlags) -> bool| -> Vec<String> {
        outcomes
            .iter()
            .filter(|o| pick(&o.flags))
            .map(|o| o.label.clone())
            .collect()
    };
    let (sat, unsat) = (proved(|f| f.sat), proved(|f| f.unsat));
    if !sat.is_empty() && !unsat.is_empty() {
        obs::emit_proof_conflict(&set.instance, &sat, &unsat);
        diagnostics.push(Diagnostic::ContradictoryProof {
            instance: set.instance.clone(),
            sat,
            unsat,
        });
    }

    Some(InstanceRanking {
        instance: set.instance.clone(),
        policy,
        best_objective,
        best_time,
        fastest_among_best,
        ordered,
        outcomes,
        diagnostics,
    })
}

// ---------------------------------------------------------------------------
// Corpus aggregation
// ---------------------------------------------------------------------------

/// Which instances take part in a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageMode {
    /// Only instances every configuration produced a log for.
    #[default]
    Intersection,
    /// Instances at least one configuration produced a log for.
    Union,
}

impl CoverageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageMode::Intersection => "intersection",
            CoverageMode::Union => "union",
        }
    }
}

impl FromStr for CoverageMode {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "intersection" => Ok(CoverageMode::Intersection),
            "union" => Ok(CoverageMode::Union),
            other => Err(BenchError::InvalidConfig(format!(
                "unknown coverage mode: {other}"
            ))),
        }
    }
}

/// Corpus counts for one configuration (or a synthetic row).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub label: String,
    pub sat_count: usize,
    pub unsat_count: usize,
    pub proven_count: usize,
    pub best_found_count: usize,
    pub fastest_count: usize,
}

impl AggregateRow {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, flags: &InstanceFlags) {
        self.sat_count += usize::from(flags.sat);
        self.unsat_count += usize::from(flags.unsat);
        self.proven_count += usize::from(flags.proven);
        self.best_found_count += usize::from(flags.found_best);
        self.fastest_count += usize::from(flags.fastest);
    }
}

/// What [`Aggregator::fold`] did with an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    Included,
    /// Left out by the coverage mode.
    Excluded,
    /// No records at all.
    Skipped,
}

/// Result of a full aggregation pass, handed to report consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub generated_at: DateTime<Utc>,
    pub max_time: f64,
    pub coverage: CoverageMode,
    /// One row per configuration, in configuration order.
    pub rows: Vec<AggregateRow>,
    pub vbs: AggregateRow,
    pub external: Option<AggregateRow>,
    pub included: Vec<String>,
    pub excluded: Vec<String>,
    pub skipped: Vec<String>,
    pub rankings: Vec<InstanceRanking>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AggregateReport {
    pub fn row(&self, label: &str) -> Option<&AggregateRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Configuration rows followed by the VBS and external rows.
    pub fn all_rows(&self) -> impl Iterator<Item = &AggregateRow> {
        self.rows
            .iter()
            .chain(std::iter::once(&self.vbs))
            .chain(self.external.iter())
    }
}

/// Aggregation context for one report.
#[derive(Debug, Clone)]
pub struct Aggregator {
    labels: Vec<String>,
    max_time: f64,
    coverage: CoverageMode,
    rows: Vec<AggregateRow>,
    vbs: AggregateRow,
    included: Vec<String>,
    excluded: Vec<String>,
    skipped: Vec<String>,
    rankings: Vec<InstanceRanking>,
    diagnostics: Vec<Diagnostic>,
}

impl Aggregator {
    pub fn new(labels: Vec<String>, max_time: f64, coverage: CoverageMode) -> Self {
        let rows = labels.iter().map(AggregateRow::new).collect();
        Self {
            labels,
            max_time,
            coverage,
            rows,
            vbs: AggregateRow::new(VBS_LABEL),
            included: Vec::new(),
            excluded: Vec::new(),
            skipped: Vec::new(),
            rankings: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Fold one instance into the running counts.
    pub fn fold(&mut self, set: &InstanceResultSet) -> Inclusion {
        if set.is_empty() {
            self.skipped.push(set.instance.clone());
            return Inclusion::Skipped;
        }

        let present: Vec<&String> = self.labels.iter().filter(|l| set.has_result(l)).collect();
        let keep = match self.coverage {
            CoverageMode::Intersection => present.len() == self.labels.len() && !present.is_empty(),
            CoverageMode::Union => !present.is_empty(),
        };
        if !keep {
            tracing::debug!(
                instance = %set.instance,
                present = present.len(),
                configurations = self.labels.len(),
                "instance excluded by coverage"
            );
            self.excluded.push(set.instance.clone());
            return Inclusion::Excluded;
        }

        let mut covered = InstanceResultSet::new(set.instance.clone());
        for label in present {
            if let Some(record) = set.get(label) {
                covered.insert(record.clone());
            }
        }

        let Some(ranking) = rank_instance(&covered, self.max_time) else {
            self.skipped.push(set.instance.clone());
            return Inclusion::Skipped;
        };

        for outcome in &ranking.outcomes {
            if let Some(row) = self.rows.iter_mut().find(|r| r.label == outcome.label) {
                row.add(&outcome.flags);
            }
        }
        self.vbs.add(&ranking.oracle());
        self.diagnostics.extend(ranking.diagnostics.iter().cloned());
        self.included.push(set.instance.clone());
        self.rankings.push(ranking);
        Inclusion::Included
    }

    /// Close the pass, adding the external row when a table is supplied.
    pub fn finish(self, best_known: Option<&BestKnownTable>) -> AggregateReport {
        let external = best_known.map(|table| {
            let mut row = AggregateRow::new(EXTERNAL_LABEL);
            for entry in self.included.iter().filter_map(|i| table.get(i)) {
                row.best_found_count += usize::from(entry.has_best());
                row.proven_count += usize::from(entry.is_certified());
            }
            row
        });

        AggregateReport {
            generated_at: Utc::now(),
            max_time: self.max_time,
            coverage: self.coverage,
            rows: self.rows,
            vbs: self.vbs,
            external,
            included: self.included,
            excluded: self.excluded,
            skipped: self.skipped,
            rankings: self.rankings,
            diagnostics: self.diagnostics,
        }
    }
}

/// Convenience wrapper: fold every set and finish.
pub fn aggregate<'a>(
    labels: Vec<String>,
    max_time: f64,
    coverage: CoverageMode,
    sets: impl IntoIterator<Item = &'a InstanceResultSet>,
    best_known: Option<&BestKnownTable>,
) -> AggregateReport {
    let mut aggregator = Aggregator::new(labels, max_time, coverage);
    for set in sets {
        aggregator.fold(set);
    }
    aggregator.finish(best_known)
}
