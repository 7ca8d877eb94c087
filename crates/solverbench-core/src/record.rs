//! Canonical performance records.
//!
//! A [`ResultRecord`] is derived from one run's captured standard output and
//! is never mutated after extraction. [`InstanceResultSet`] groups the
//! records of every configuration for one problem instance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Whether an instance is a satisfaction or an optimisation problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Policy {
    Min,
    Max,
    Sat,
    Unknown,
}

impl Policy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::Min => "MIN",
            Policy::Max => "MAX",
            Policy::Sat => "SAT",
            Policy::Unknown => "UNKNOWN",
        }
    }

    /// Returns `true` for `Min` and `Max`.
    pub fn is_optimisation(&self) -> bool {
        matches!(self, Policy::Min | Policy::Max)
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How conclusive the solver said its answer was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofStatus {
    /// Search completed exhaustively, or infeasibility was proven.
    Proof,
    /// The problem was proven unbounded.
    Unbounded,
    /// A terminal line was printed but it is not a certificate.
    Unknown,
    /// No terminal line at all.
    Blank,
}

impl ProofStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofStatus::Proof => "proof",
            ProofStatus::Unbounded => "unbounded",
            ProofStatus::Unknown => "unknown",
            ProofStatus::Blank => "",
        }
    }
}

/// Performance record for one (instance, configuration) pair.
///
/// # Invariants
///
/// `elapsed_time` lies in `[0, max_time]` for the `max_time` the record was
/// extracted with. `solution_count == -1` marks the sentinel produced for
/// missing or unrecognisable logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub solution_count: i64,
    /// Seconds.
    pub elapsed_time: f64,
    /// `None` when the node count is unknown.
    pub node_count: Option<u64>,
    /// Pre-solve setup time in seconds.
    pub build_time: f64,
    pub policy: Policy,
    /// Last reported objective; `None` when no objective was announced.
    pub objective: Option<i64>,
    pub proof_status: ProofStatus,
    pub config_label: String,
}

impl ResultRecord {
    /// The record used when a run left nothing usable behind.
    pub fn sentinel(config_label: impl Into<String>, max_time: f64) -> Self {
        Self {
            solution_count: -1,
            elapsed_time: max_time,
            node_count: None,
            build_time: 0.0,
            policy: Policy::Unknown,
            objective: None,
            proof_status: ProofStatus::Unknown,
            config_label: config_label.into(),
        }
    }

    /// Whether this record stands for a missing or unreadable log.
    pub fn is_sentinel(&self) -> bool {
        self.solution_count < 0
    }

    /// Whether the run reported some definite outcome.
    ///
    /// Only an `Unknown` proof status without a single solution is
    /// inconclusive.
    pub fn is_definite(&self) -> bool {
        !(self.proof_status == ProofStatus::Unknown && self.solution_count <= 0)
    }

    pub fn is_proven(&self) -> bool {
        self.proof_status == ProofStatus::Proof
    }
}

/// All configuration records for one problem instance, keyed by label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceResultSet {
    pub instance: String,
    pub records: BTreeMap<String, ResultRecord>,
}

impl InstanceResultSet {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            records: BTreeMap::new(),
        }
    }

    /// Insert a record under its own label, replacing any previous one.
    pub fn insert(&mut self, record: ResultRecord) {
        self.records.insert(record.config_label.clone(), record);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, record: ResultRecord) -> Self {
        self.insert(record);
        self
    }

    pub fn get(&self, label: &str) -> Option<&ResultRecord> {
        self.records.get(label)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether `label` produced a usable log for this instance.
    pub fn has_result(&self, label: &str) -> bool {
        self.records.get(label).is_some_and(|r| !r.is_sentinel())
    }
}
