//! Campaign planning: expands instances × configurations into jobs.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use solverbench_core::artifacts::{error_log_path_for, instance_name, log_path_for, PAIR_SEPARATOR};

use crate::error::{RunnerError, RunnerResult};
use crate::job::JobDescriptor;

/// Default extra time granted past the solver's own limit, so it can print
/// final statistics before being killed.
pub const DEFAULT_DEADLINE_SLACK: Duration = Duration::from_secs(5);

/// A named set of solver flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Configuration {
    pub label: String,
    #[serde(default)]
    pub flags: String,
}

impl Configuration {
    pub fn new(label: impl Into<String>, flags: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            flags: flags.into(),
        }
    }
}

/// Everything needed to plan one benchmarking campaign.
#[derive(Debug, Clone, PartialEq)]
pub struct Campaign {
    pub solver: String,
    pub output_dir: PathBuf,
    pub time_limit: Duration,
    pub deadline_slack: Duration,
    pub configurations: Vec<Configuration>,
    pub instances: Vec<PathBuf>,
}

/// A job together with the (instance, configuration) pair it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedJob {
    pub instance: String,
    pub label: String,
    pub job: JobDescriptor,
}

impl Campaign {
    /// Ceiling used to clamp elapsed times during extraction.
    pub fn max_time_secs(&self) -> f64 {
        self.time_limit.as_secs_f64()
    }

    pub fn labels(&self) -> Vec<String> {
        self.configurations.iter().map(|c| c.label.clone()).collect()
    }

    pub fn instance_names(&self) -> Vec<String> {
        self.instances.iter().map(|p| instance_name(p)).collect()
    }

    pub fn validate(&self) -> RunnerResult<()> {
        if self.solver.trim().is_empty() {
            return Err(RunnerError::InvalidCampaign("solver must not be empty".into()));
        }
        if self.time_limit.is_zero() {
            return Err(RunnerError::InvalidCampaign("time limit must be positive".into()));
        }
        if self.configurations.is_empty() {
            return Err(RunnerError::InvalidCampaign("at least one configuration is required".into()));
        }

        let mut seen = HashSet::new();
        for config in &self.configurations {
            let label = config.label.as_str();
            if label.is_empty() {
                return Err(RunnerError::InvalidCampaign("configuration label must not be empty".into()));
            }
            if label.contains(PAIR_SEPARATOR) || label.contains('/') {
                return Err(RunnerError::InvalidCampaign(format!(
                    "configuration label {label:?} must not contain '{PAIR_SEPARATOR}' or '/'"
                )));
            }
            if !seen.insert(label) {
                return Err(RunnerError::InvalidCampaign(format!("duplicate configuration label {label:?}")));
            }
        }

        let mut names = HashSet::new();
        for name in self.instance_names() {
            if !names.insert(name.clone()) {
                return Err(RunnerError::InvalidCampaign(format!(
                    "two instances share the artifact name {name:?}"
                )));
            }
        }
        Ok(())
    }

    /// Instance-major expansion: every configuration of the first instance,
    /// then the second, and so on.
    pub fn plan_jobs(&self) -> Vec<PlannedJob> {
        let limit_ms = self.time_limit.as_millis();
        let deadline = self.time_limit.saturating_add(self.deadline_slack);
        let solver = shell_quote(&self.solver);

        let mut planned = Vec::with_capacity(self.instances.len() * self.configurations.len());
        for path in &self.instances {
            let instance = instance_name(path);
            let target = shell_quote(&path.to_string_lossy());
            for config in &self.configurations {
                let flags = config.flags.trim();
                let invocation = if flags.is_empty() {
                    format!("{solver} -tl {limit_ms} {target}")
                } else {
                    format!("{solver} {flags} -tl {limit_ms} {target}")
                };
                planned.push(PlannedJob {
                    job: JobDescriptor::new(
                        invocation,
                        log_path_for(&self.output_dir, &instance, &config.label),
                        error_log_path_for(&self.output_dir, &instance, &config.label),
                        deadline,
                    ),
                    instance: instance.clone(),
                    label: config.label.clone(),
                });
            }
        }
        planned
    }
}

/// Quote `word` for `sh` unless it is made only of safe characters.
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
