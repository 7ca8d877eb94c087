//! Output-format dialects of the solver's one-line statistics.
//!
//! The solver has printed its running statistics in (at least) two layouts
//! over time. Both start with `<n> Solutions, ` and, for optimisation
//! problems, an objective field such as `Minimize cost = 12`; they differ in
//! where the elapsed time and node count sit.
//!
//! ```text
//! short: 3 Solutions, [Minimize x = 12, ]Resolution 1.234s, 456 Nodes (369.5 n/s), 12 Backtracks, ...
//! full:  3 Solutions, [Minimize x = 12, ]Building time : 0.100s, Initialisation : 0.010s,
//!        Initial propagation : 0.005s, Total 1.234s, 456 Nodes (369.5 n/s), ...
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BenchError;

/// Named historical layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    /// `Resolution <t>s` layout.
    Short,
    /// `Building time : ... Total <t>s` layout.
    Full,
}

impl DialectKind {
    pub fn name(&self) -> &'static str {
        match self {
            DialectKind::Short => "short",
            DialectKind::Full => "full",
        }
    }
}

impl FromStr for DialectKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" | "resolution" => Ok(DialectKind::Short),
            "full" | "total" => Ok(DialectKind::Full),
            other => Err(BenchError::UnknownDialect(other.to_string())),
        }
    }
}

/// Which of two equal-count trailing solution lines to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieRule {
    /// Some solver versions repeat the final statistics as a summary line
    /// with shifted fields; the earlier line matches the layout.
    #[default]
    PreferEarlier,
    /// Always take the most recent line.
    PreferLatest,
}

/// Fixed field offsets inside a `", "`-separated solutions line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub time: usize,
    pub nodes: usize,
    pub objective: Option<usize>,
}

impl FieldLayout {
    /// Smallest field count a line needs for this layout.
    pub fn min_fields(&self) -> usize {
        self.time.max(self.nodes).max(self.objective.unwrap_or(0)) + 1
    }
}

/// A dialect plus the tie rule used when picking the line to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialect {
    pub kind: DialectKind,
    #[serde(default)]
    pub tie_rule: TieRule,
}

impl Dialect {
    pub fn new(kind: DialectKind) -> Self {
        Self {
            kind,
            tie_rule: TieRule::default(),
        }
    }

    pub fn short() -> Self {
        Self::new(DialectKind::Short)
    }

    pub fn full() -> Self {
        Self::new(DialectKind::Full)
    }

    pub fn with_tie_rule(mut self, tie_rule: TieRule) -> Self {
        self.tie_rule = tie_rule;
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Field offsets for a satisfaction (`optimisation == false`) or an
    /// optimisation line.
    pub fn layout(&self, optimisation: bool) -> FieldLayout {
        match (self.kind, optimisation) {
            (DialectKind::Short, false) => FieldLayout {
                time: 1,
                nodes: 2,
                objective: None,
            },
            (DialectKind::Short, true) => FieldLayout {
                time: 2,
                nodes: 3,
                objective: Some(1),
            },
            (DialectKind::Full, false) => FieldLayout {
                time: 4,
                nodes: 5,
                objective: None,
            },
            (DialectKind::Full, true) => FieldLayout {
                time: 5,
                nodes: 6,
                objective: Some(1),
            },
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_kind_from_str() {
        assert_eq!("short".parse::<DialectKind>().unwrap(), DialectKind::Short);
        assert_eq!(" FULL ".parse::<DialectKind>().unwrap(), DialectKind::Full);
        assert!(matches!(
            "xml".parse::<DialectKind>(),
            Err(BenchError::UnknownDialect(_))
        ));
    }

    #[test]
    fn test_optimisation_layout_shifts_by_objective() {
        for dialect in [Dialect::short(), Dialect::full()] {
            let sat = dialect.layout(false);
            let opt = dialect.layout(true);
            assert_eq!(opt.time, sat.time + 1);
            assert_eq!(opt.nodes, sat.nodes + 1);
            assert_eq!(opt.objective, Some(1));
        }
    }

    #[test]
    fn test_min_fields() {
        assert_eq!(Dialect::short().layout(false).min_fields(), 3);
        assert_eq!(Dialect::full().layout(true).min_fields(), 7);
    }

    #[test]
    fn test_default_tie_rule_prefers_earlier() {
        assert_eq!(Dialect::full().tie_rule, TieRule::PreferEarlier);
        let latest = Dialect::short().with_tie_rule(TieRule::PreferLatest);
        assert_eq!(latest.tie_rule, TieRule::PreferLatest);
    }
}
