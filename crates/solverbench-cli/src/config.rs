//! Campaign configuration
//!
//! A campaign is described by one TOML file. Relative paths inside it are
//! resolved against the file's directory so a campaign can be run from
//! anywhere.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use solverbench_core::best_known::DEFAULT_DELIMITER;
use solverbench_core::{BestKnownTable, CoverageMode, Dialect, DialectKind, TieRule};
use solverbench_runner::{Campaign, Configuration};

fn default_deadline_slack() -> f64 {
    solverbench_runner::DEFAULT_DEADLINE_SLACK.as_secs_f64()
}

fn default_concurrency() -> usize {
    1
}

fn default_dialect() -> DialectKind {
    DialectKind::Full
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

/// Campaign file contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CampaignConfig {
    /// Solver executable
    pub solver: String,

    /// Where logs, error logs and the ledger are written
    pub output_dir: PathBuf,

    /// Time limit handed to the solver, also the clamping ceiling
    pub time_limit_secs: f64,

    /// Extra wall-clock time before the supervisor kills a run
    #[serde(default = "default_deadline_slack")]
    pub deadline_slack_secs: f64,

    /// Max parallel solver runs
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_dialect")]
    pub dialect: DialectKind,

    #[serde(default)]
    pub tie_rule: TieRule,

    #[serde(default)]
    pub coverage: CoverageMode,

    /// Optional best-known results table
    #[serde(default)]
    pub best_known: Option<PathBuf>,

    #[serde(default = "default_delimiter")]
    pub best_known_delimiter: char,

    #[serde(default)]
    pub instances: Vec<PathBuf>,

    #[serde(default)]
    pub configurations: Vec<Configuration>,
}

impl CampaignConfig {
    /// Read, resolve and validate a campaign file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read campaign {}", path.display()))?;
        let mut config: CampaignConfig = toml::from_str(&text)
            .with_context(|| format!("parse campaign {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &Path| if p.is_absolute() { p.to_path_buf() } else { base.join(p) };
        self.output_dir = resolve(&self.output_dir);
        self.best_known = self.best_known.as_deref().map(resolve);
        self.instances = self.instances.iter().map(|p| resolve(p)).collect();
        // a bare command name is looked up on PATH, not beside the file
        if self.solver.contains('/') {
            self.solver = resolve(Path::new(&self.solver)).to_string_lossy().into_owned();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }
        if !self.time_limit_secs.is_finite() || self.time_limit_secs <= 0.0 {
            anyhow::bail!("time_limit_secs must be positive, got {}", self.time_limit_secs);
        }
        if !self.deadline_slack_secs.is_finite() || self.deadline_slack_secs < 0.0 {
            anyhow::bail!(
                "deadline_slack_secs must not be negative, got {}",
                self.deadline_slack_secs
            );
        }
        self.campaign()?.validate().context("invalid campaign")?;
        Ok(())
    }

    /// Planning view of this file. Fails on durations that do not fit.
    pub fn campaign(&self) -> Result<Campaign> {
        let time_limit = Duration::try_from_secs_f64(self.time_limit_secs)
            .with_context(|| format!("time_limit_secs out of range: {}", self.time_limit_secs))?;
        let deadline_slack = Duration::try_from_secs_f64(self.deadline_slack_secs).with_context(|| {
            format!("deadline_slack_secs out of range: {}", self.deadline_slack_secs)
        })?;
        Ok(Campaign {
            solver: self.solver.clone(),
            output_dir: self.output_dir.clone(),
            time_limit,
            deadline_slack,
            configurations: self.configurations.clone(),
            instances: self.instances.clone(),
        })
    }

    pub fn dialect(&self) -> Dialect {
        Dialect::new(self.dialect).with_tie_rule(self.tie_rule)
    }

    pub fn best_known_table(&self) -> Result<Option<BestKnownTable>> {
        let Some(path) = &self.best_known else {
            return Ok(None);
        };
        let table = BestKnownTable::load(path, self.best_known_delimiter)
            .with_context(|| format!("load best-known table {}", path.display()))?;
        Ok(Some(table))
    }

    /// Default location of the batch ledger.
    pub fn ledger_path(&self, batch_id: &str) -> PathBuf {
        self.output_dir.join(format!("ledger-{batch_id}.json"))
    }
}
